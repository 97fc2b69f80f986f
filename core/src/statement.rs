//! Parameterized statements handed to an executor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Whether statement text is SQL or the name of a stored routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatementKind {
    /// Free SQL text.
    #[default]
    Text,
    /// The name of a stored procedure to invoke.
    Procedure,
}

/// A named bound parameter.
///
/// `name` carries no engine prefix; the dialect decides how it appears in
/// statement text (e.g. `@Age_0`) and the executor binds it accordingly.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Statement text plus its ordered parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub kind: StatementKind,
    pub parameters: Vec<Parameter>,
}

impl Statement {
    pub fn new(text: impl Into<String>, kind: StatementKind, parameters: Vec<Parameter>) -> Self {
        Self {
            text: text.into(),
            kind,
            parameters,
        }
    }

    /// A text statement with no parameters.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, StatementKind::Text, Vec::new())
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
