use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::cli::StagingMode;
use crate::error::SchemaError;
use crate::pivot::{self, PivotPlan, STAGING_SCHEMA, WIDE_TABLE};
use crate::reconcile::{Dataset, ReconcilePlan};
use crate::schema::Report;

/// File extension of every emitted script.
pub const SCRIPT_EXTENSION: &str = "sql";

#[derive(Debug, Clone)]
pub struct ScriptOptions {
    pub staging: StagingMode,
    /// Loadable module that provides `to_int`, `datetime_format` and the
    /// per-column GUID lookups referenced by the extraction views.
    pub coercion_module: String,
}

/// Concatenates one report's fragments in their required order: session
/// setup, wide-table DDL, extraction views, population, wide-table
/// export, then the per-dataset reconciliation blocks.
pub fn assemble(
    report: &Report,
    options: &ScriptOptions,
    plan: &PivotPlan,
    recon: &ReconcilePlan,
) -> String {
    let export = pivot::export_file(&report.artifact, options.staging);
    let mut script = String::new();
    script.push_str(&format!(".load {}\n\n", options.coercion_module));
    script.push_str(&plan.attach);
    script.push('\n');
    script.push_str(&plan.table_ddl);
    script.push_str(&plan.views.iter().join(""));
    script.push_str(&plan.population.iter().join(""));
    script.push_str(".headers on\n.mode csv\n");
    script.push_str(&format!(".output {export}\n"));
    script.push_str(&format!("select * from {STAGING_SCHEMA}.{WIDE_TABLE};\n"));
    script.push_str(".output stdout\n\n");
    script.push_str(&recon.imports.iter().join(""));
    script.push('\n');
    script.push_str(&recon.blocks.iter().join("\n"));
    script.push_str(".exit\n");
    script
}

/// Composes pivot and reconciliation for one report. The reconciliation
/// re-imports the wide table's own CSV export so that every comparison
/// happens between uniformly text-typed row sets.
pub fn compose(
    report: &Report,
    row_id: &str,
    table_sql: &str,
    options: &ScriptOptions,
    datasets: &[Dataset],
) -> Result<String, crate::error::SynthesisError> {
    let plan = pivot::synthesize(report, row_id, table_sql, options.staging)?;
    let export = pivot::export_file(&report.artifact, options.staging);
    let recon = crate::reconcile::plan(&report.artifact, &export, datasets);
    Ok(assemble(report, options, &plan, &recon))
}

/// Writes one report's script in a single operation so a failure while
/// synthesizing one report never leaves another report's artifact half
/// written.
pub fn write_artifact(out_dir: &Path, artifact: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Creating output directory {out_dir:?}"))?;
    let path = out_dir.join(format!("{artifact}.{SCRIPT_EXTENSION}"));
    fs::write(&path, contents).with_context(|| format!("Writing script {path:?}"))?;
    Ok(path)
}

pub fn is_conflicted(artifact: &str, conflicts: &[SchemaError]) -> bool {
    conflicts.iter().any(|conflict| {
        matches!(conflict, SchemaError::ArtifactNameConflict { artifact: name, .. }
            if name == artifact)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ColumnType;
    use crate::reconcile::default_datasets;
    use crate::schema::Column;

    fn sample_report() -> Report {
        Report {
            title: "My Report".to_string(),
            artifact: "My_Report".to_string(),
            columns: vec![
                Column {
                    title: "WorkId".to_string(),
                    code: None,
                    kind: ColumnType::Integer,
                },
                Column {
                    title: "Status".to_string(),
                    code: Some("7".to_string()),
                    kind: ColumnType::String,
                },
            ],
        }
    }

    fn options() -> ScriptOptions {
        ScriptOptions {
            staging: StagingMode::Memory,
            coercion_module: "dtformat".to_string(),
        }
    }

    #[test]
    fn fragments_appear_in_dependency_order() {
        let script = compose(
            &sample_report(),
            "WorkId",
            "SystemIndex_1_PropertyStore",
            &options(),
            &default_datasets(),
        )
        .expect("compose");

        let positions: Vec<usize> = [
            ".load dtformat",
            "ATTACH DATABASE '' AS named;",
            "CREATE TABLE named.NamedFields(",
            "CREATE TEMP VIEW WorkId",
            "CREATE TEMP VIEW Status",
            "insert into named.NamedFields(WorkId)",
            "UPDATE named.NamedFields set Status=",
            ".output My_Report_test.csv",
            "select * from named.NamedFields;",
            ".import My_Report_test.csv My_Report --csv",
            "create table diffs_ese_csv",
            ".once My_Report_ese_csv.discrepancy",
            "create table diffs_ese_json",
            ".once My_Report_ese_json.discrepancy",
            ".exit",
        ]
        .iter()
        .map(|needle| script.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn write_artifact_names_file_after_the_normalized_title() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_artifact(dir.path(), "My_Report", ".exit\n").expect("write");
        assert_eq!(path.file_name().unwrap(), "My_Report.sql");
        assert_eq!(std::fs::read_to_string(path).expect("read"), ".exit\n");
    }

    #[test]
    fn conflict_lookup_matches_on_artifact_name() {
        let conflicts = vec![SchemaError::ArtifactNameConflict {
            artifact: "A_B".to_string(),
            titles: vec!["A/B".to_string(), "A B".to_string()],
        }];
        assert!(is_conflicted("A_B", &conflicts));
        assert!(!is_conflicted("C", &conflicts));
    }
}
