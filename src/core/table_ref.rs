use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::TabulaError;

/// Composite addressing key for a warehouse table: `(schema, name)`.
///
/// Immutable once a table is selected; every load and overwrite against the
/// store is keyed by it. Displays as `SCHEMA.NAME`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

impl FromStr for TableRef {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() => {
                Ok(TableRef::new(schema, name))
            }
            _ => Err(TabulaError::TableNotFound(format!(
                "'{s}' is not a SCHEMA.NAME identifier"
            ))),
        }
    }
}
