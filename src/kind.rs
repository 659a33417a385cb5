use serde::{Deserialize, Serialize};

/// Declared kind of a report column. The set is closed: anything outside
/// these four is a schema error at load time, never a silent fallback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Integer,
    DateTime,
    Guid,
}

impl ColumnType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "String" => Some(ColumnType::String),
            "Integer" => Some(ColumnType::Integer),
            "DateTime" => Some(ColumnType::DateTime),
            "GUID" => Some(ColumnType::Guid),
            _ => None,
        }
    }

    /// Wraps `source_expr` in the coercion the emitted script applies when
    /// reading raw EAV values. `String` passes through untouched; `Guid`
    /// dispatches to a per-column lookup function named after the column.
    pub fn coerce(&self, column_title: &str, source_expr: &str) -> String {
        match self {
            ColumnType::String => source_expr.to_string(),
            ColumnType::Integer => format!("to_int({source_expr})"),
            ColumnType::DateTime => format!("datetime_format({source_expr})"),
            ColumnType::Guid => {
                format!("get_{}({source_expr})", column_title.to_lowercase())
            }
        }
    }
}
