use std::collections::HashMap;

use crate::error::EvaluationError;

/// Symbol table of current readings, keyed by variable name.
///
/// Built fresh by the caller for each evaluation. The engine only reads it.
pub type InnerTable = HashMap<String, f64>;

/// Resolve a variable to its reading.
///
/// A missing name is an error, never an implicit zero.
pub fn lookup(table: &InnerTable, name: &str) -> Result<f64, EvaluationError> {
    table
        .get(name)
        .copied()
        .ok_or_else(|| EvaluationError::UnboundVariable(name.to_owned()))
}
