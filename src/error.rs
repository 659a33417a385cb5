use thiserror::Error;

/// Problems with the declared schema itself. Fatal for the affected
/// report(s); other reports in the same run keep going.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("report '{report}': column '{column}' has unrecognized kind '{kind}'")]
    UnknownKind {
        report: String,
        column: String,
        kind: String,
    },
    #[error("reports {titles:?} all map to artifact name '{artifact}'")]
    ArtifactNameConflict {
        artifact: String,
        titles: Vec<String>,
    },
    #[error("schema declares no reports")]
    NoReports,
}

/// Internal inconsistencies detected while synthesizing a report's script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("report '{report}': row identifier column '{row_id}' is missing")]
    MissingRowId { report: String, row_id: String },
    #[error("report '{report}': row identifier column '{row_id}' appears more than once")]
    DuplicateRowId { report: String, row_id: String },
}
