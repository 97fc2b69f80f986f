//! A facade that deletes what it inserted.

use std::ops::Deref;

use dynamic_db_core::{PropertyBag, Record};
use tracing::{debug, warn};

use crate::error::Result;
use crate::executor::StatementExecutor;
use crate::facade::DynamicDb;
use crate::row::Row;

/// Wraps a [`DynamicDb`] for tests that seed data.
///
/// Rows inserted with [`insert_tracked`](Self::insert_tracked) are deleted
/// by primary key when the harness is dropped, most recent batch first, so
/// child rows go before the parents they were inserted after. Drop cannot
/// report errors, so a failed cleanup there is logged and left behind; call
/// [`cleanup`](Self::cleanup) to see failures.
///
/// Every other facade operation is available through `Deref`.
pub struct TestDb<E: StatementExecutor> {
    db: DynamicDb<E>,
    tracked: Vec<(String, Vec<Record>)>,
}

impl<E: StatementExecutor> TestDb<E> {
    pub fn new(db: DynamicDb<E>) -> Self {
        Self {
            db,
            tracked: Vec::new(),
        }
    }

    /// Inserts `records` and remembers the returned rows for deletion.
    pub fn insert_tracked(&mut self, table: &str, records: &[Record]) -> Result<Vec<Row>> {
        let rows = self.db.insert(table, records)?;
        if !rows.is_empty() {
            self.tracked
                .push((table.to_string(), rows.iter().map(Row::to_record).collect()));
        }
        Ok(rows)
    }

    /// Number of tracked insert batches not yet deleted.
    pub fn tracked_batches(&self) -> usize {
        self.tracked.len()
    }

    /// Deletes every tracked batch, most recent first, and returns the
    /// number of rows deleted.
    ///
    /// # Errors
    ///
    /// Stops at the first failing batch; it and every older batch stay
    /// tracked.
    pub fn cleanup(&mut self) -> Result<usize> {
        let mut deleted = 0;
        while let Some((table, records)) = self.tracked.pop() {
            match self.db.delete_by_keys(&table, &records) {
                Ok(rows) => {
                    debug!(table = %table, rows = rows.len(), "Deleted tracked rows");
                    deleted += rows.len();
                }
                Err(error) => {
                    self.tracked.push((table, records));
                    return Err(error);
                }
            }
        }
        Ok(deleted)
    }
}

impl<E: StatementExecutor> Deref for TestDb<E> {
    type Target = DynamicDb<E>;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl<E: StatementExecutor> Drop for TestDb<E> {
    fn drop(&mut self) {
        if self.tracked.is_empty() {
            return;
        }
        if let Err(error) = self.cleanup() {
            warn!(
                error = %error,
                batches = self.tracked.len(),
                "Failed to delete tracked rows"
            );
        }
    }
}
