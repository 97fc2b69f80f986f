//! The boundary to a live database connection.
//!
//! Connection acquisition, pooling, and transactions live outside this
//! crate. A [`StatementExecutor`] is "an open connection handle that can run
//! one statement": it either reports an affected-row count or streams a
//! forward-only cursor into a [`RowSink`].

use dynamic_db_core::{RowShape, Statement, Value};

use crate::dialect::Dialect;
use crate::error::Result;

/// Runs statements against one open connection.
///
/// Implementations map their native failures into
/// [`DynamicDbError::Engine`](crate::DynamicDbError::Engine) without
/// rewording them.
pub trait StatementExecutor {
    /// Identifies the logical database behind this connection.
    ///
    /// Shared caches are partitioned by this value, so two executors that
    /// reach the same database must report the same identity and executors
    /// reaching different databases must not.
    fn connection_identity(&self) -> &str;

    /// The SQL dialect this connection speaks.
    fn dialect(&self) -> &dyn Dialect;

    /// Runs a statement and returns the number of affected rows.
    fn execute(&self, statement: &Statement) -> Result<usize>;

    /// Runs a statement and streams its result cursor into `sink`.
    ///
    /// `sink.begin` is called exactly once with the cursor's shape before
    /// any row, then `sink.row` once per row with values in shape order.
    /// An error from the sink aborts the cursor and is returned as-is.
    fn query(&self, statement: &Statement, sink: &mut dyn RowSink) -> Result<()>;
}

impl<T: StatementExecutor + ?Sized> StatementExecutor for &T {
    fn connection_identity(&self) -> &str {
        (**self).connection_identity()
    }

    fn dialect(&self) -> &dyn Dialect {
        (**self).dialect()
    }

    fn execute(&self, statement: &Statement) -> Result<usize> {
        (**self).execute(statement)
    }

    fn query(&self, statement: &Statement, sink: &mut dyn RowSink) -> Result<()> {
        (**self).query(statement, sink)
    }
}

impl<T: StatementExecutor + ?Sized> StatementExecutor for Box<T> {
    fn connection_identity(&self) -> &str {
        (**self).connection_identity()
    }

    fn dialect(&self) -> &dyn Dialect {
        (**self).dialect()
    }

    fn execute(&self, statement: &Statement) -> Result<usize> {
        (**self).execute(statement)
    }

    fn query(&self, statement: &Statement, sink: &mut dyn RowSink) -> Result<()> {
        (**self).query(statement, sink)
    }
}

/// Receives a result cursor.
pub trait RowSink {
    fn begin(&mut self, shape: &RowShape) -> Result<()>;

    fn row(&mut self, values: Vec<Value>) -> Result<()>;
}

/// A sink that keeps the shape and raw rows as they arrive.
#[derive(Debug, Default)]
pub struct CollectRows {
    pub shape: RowShape,
    pub rows: Vec<Vec<Value>>,
}

impl RowSink for CollectRows {
    fn begin(&mut self, shape: &RowShape) -> Result<()> {
        self.shape = shape.clone();
        Ok(())
    }

    fn row(&mut self, values: Vec<Value>) -> Result<()> {
        self.rows.push(values);
        Ok(())
    }
}
