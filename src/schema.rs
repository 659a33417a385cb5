use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::kind::ColumnType;
use crate::yaml_provider;

/// Raw configuration as written in the schema file. `kind` stays a plain
/// string here so an unrecognized value can be reported with the report
/// and column it came from instead of a generic deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnCfg {
    pub title: String,
    #[serde(default)]
    pub sql: Option<SqlBinding>,
    pub kind: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlBinding {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCfg {
    pub title: String,
    pub columns: Vec<ColumnCfg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsCfg {
    /// EAV source table each extraction view scans.
    pub table_sql: String,
    /// Name of the row identifier column present in every report.
    #[serde(default = "default_row_id")]
    pub row_id: String,
    #[serde(default)]
    pub output_dir: Option<String>,
    pub reports: Vec<ReportCfg>,
}

fn default_enabled() -> bool {
    true
}

fn default_row_id() -> String {
    "WorkId".to_string()
}

impl ReportsCfg {
    pub fn load(path: &Path) -> Result<Self> {
        let cfg: ReportsCfg = yaml_provider::load_from_path(path)
            .with_context(|| format!("Loading reports schema from {path:?}"))?;
        Ok(cfg)
    }
}

/// A column that survived validation. `code` is `None` for declared but
/// inactive columns (no attribute code, or explicitly disabled); inactive
/// columns produce no view, no DDL field and no update statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub title: String,
    pub code: Option<String>,
    pub kind: ColumnType,
}

impl Column {
    pub fn is_active(&self) -> bool {
        self.code.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    /// Normalized title, used to name the emitted artifact.
    pub artifact: String,
    pub columns: Vec<Column>,
}

/// Collapses runs of whitespace and slashes to a single underscore.
/// Idempotent: normalizing a normalized title is a no-op.
pub fn normalize_title(title: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[\s/\\]+").expect("separator pattern"));
    separators.replace_all(title, "_").into_owned()
}

/// Validates one report's configuration into the typed model. An
/// unrecognized kind aborts the whole report; it is never downgraded to
/// `String`.
pub fn resolve_report(cfg: &ReportCfg) -> Result<Report, SchemaError> {
    let mut columns = Vec::with_capacity(cfg.columns.len());
    for column in &cfg.columns {
        let kind =
            ColumnType::parse(column.kind.as_str()).ok_or_else(|| SchemaError::UnknownKind {
                report: cfg.title.clone(),
                column: column.title.clone(),
                kind: column.kind.clone(),
            })?;
        let code = if column.enabled {
            column
                .sql
                .as_ref()
                .map(|binding| binding.name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        } else {
            None
        };
        columns.push(Column {
            title: column.title.clone(),
            code,
            kind,
        });
    }
    Ok(Report {
        title: cfg.title.clone(),
        artifact: normalize_title(&cfg.title),
        columns,
    })
}

/// Flags every artifact name shared by more than one report. The affected
/// reports are all skipped rather than silently overwriting each other.
pub fn detect_conflicts(reports: &[Report]) -> Vec<SchemaError> {
    let mut by_artifact: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for report in reports {
        by_artifact
            .entry(report.artifact.as_str())
            .or_default()
            .push(report.title.as_str());
    }
    by_artifact
        .into_iter()
        .filter(|(_, titles)| titles.len() > 1)
        .map(|(artifact, titles)| SchemaError::ArtifactNameConflict {
            artifact: artifact.to_string(),
            titles: titles.into_iter().map(str::to_string).collect(),
        })
        .collect()
}
