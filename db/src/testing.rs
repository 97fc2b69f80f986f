//! An executor that replays canned cursors and records what it was asked.

use std::cell::RefCell;
use std::collections::VecDeque;

use dynamic_db_core::{ColumnShape, RowShape, Statement, Value, ValueKind};

use crate::dialect::Dialect;
use crate::error::Result;
use crate::executor::{RowSink, StatementExecutor};

pub(crate) struct ScriptedExecutor<D> {
    identity: String,
    dialect: D,
    cursors: RefCell<VecDeque<Vec<Vec<Value>>>>,
    statements: RefCell<Vec<Statement>>,
}

impl<D: Dialect> ScriptedExecutor<D> {
    pub(crate) fn new(identity: &str, dialect: D) -> Self {
        Self {
            identity: identity.to_string(),
            dialect,
            cursors: RefCell::new(VecDeque::new()),
            statements: RefCell::new(Vec::new()),
        }
    }

    /// Queues the rows the next query returns.
    pub(crate) fn push_rows(&self, rows: Vec<Vec<Value>>) {
        self.cursors.borrow_mut().push_back(rows);
    }

    pub(crate) fn statements(&self) -> Vec<Statement> {
        self.statements.borrow().clone()
    }
}

impl<D: Dialect> StatementExecutor for ScriptedExecutor<D> {
    fn connection_identity(&self) -> &str {
        &self.identity
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn execute(&self, statement: &Statement) -> Result<usize> {
        self.statements.borrow_mut().push(statement.clone());
        Ok(0)
    }

    fn query(&self, statement: &Statement, sink: &mut dyn RowSink) -> Result<()> {
        self.statements.borrow_mut().push(statement.clone());
        let rows = self.cursors.borrow_mut().pop_front().unwrap_or_default();
        let width = rows.first().map_or(0, Vec::len);
        sink.begin(&RowShape::new(
            (0..width)
                .map(|i| ColumnShape::new(format!("c{i}"), ValueKind::Any, true))
                .collect(),
        ))?;
        for row in rows {
            sink.row(row)?;
        }
        Ok(())
    }
}
