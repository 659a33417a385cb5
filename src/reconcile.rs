use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use itertools::Itertools;
use log::{error, info};

use crate::assemble;
use crate::cli::ReconcileArgs;
use crate::schema::{self, ReportsCfg};

/// One independently produced export the pivoted table is compared
/// against. `alias` names the loaded table (`<report>_<alias>`) and the
/// discrepancy artifact; `file_suffix` is appended to the report name to
/// locate the export on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub alias: String,
    pub file_suffix: String,
}

impl Dataset {
    pub fn new(alias: &str, file_suffix: &str) -> Self {
        Dataset {
            alias: alias.to_string(),
            file_suffix: file_suffix.to_string(),
        }
    }
}

/// The comparison set the original tooling ships: a direct CSV export of
/// the property store and a CSV rendering of the JSON export.
pub fn default_datasets() -> Vec<Dataset> {
    vec![
        Dataset::new("ese_csv", "_ese.csv"),
        Dataset::new("ese_json", "_json.csv"),
    ]
}

/// Parses a `--dataset alias=file-suffix` argument.
pub fn parse_dataset(spec: &str) -> Result<Dataset> {
    let (alias, file_suffix) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected `alias=file-suffix`, got '{spec}'"))?;
    let alias = alias.trim();
    let file_suffix = file_suffix.trim();
    if alias.is_empty() || file_suffix.is_empty() {
        bail!("Expected `alias=file-suffix`, got '{spec}'");
    }
    Ok(Dataset::new(alias, file_suffix))
}

pub fn resolve_datasets(specs: &[String]) -> Result<Vec<Dataset>> {
    if specs.is_empty() {
        return Ok(default_datasets());
    }
    specs.iter().map(|spec| parse_dataset(spec)).collect()
}

/// SQL fragments that load each dataset and count the rows present in
/// exactly one of the two compared sets. A count of zero means the two
/// views of the data are identical.
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    pub imports: Vec<String>,
    pub blocks: Vec<String>,
}

pub fn plan(artifact: &str, pivot_export: &str, datasets: &[Dataset]) -> ReconcilePlan {
    let mut imports = Vec::with_capacity(datasets.len() + 1);
    imports.push(format!(".import {pivot_export} {artifact} --csv\n"));
    for dataset in datasets {
        imports.push(format!(
            ".import {artifact}{} {artifact}_{} --csv\n",
            dataset.file_suffix, dataset.alias
        ));
    }

    let blocks = datasets
        .iter()
        .map(|dataset| {
            let alias = dataset.alias.as_str();
            let loaded = format!("{artifact}_{alias}");
            format!(
                "create table diffs_{alias} as select * from \
                 (SELECT * FROM {artifact} EXCEPT SELECT * FROM {loaded}) \
                 union select * from \
                 (SELECT * FROM {loaded} EXCEPT SELECT * FROM {artifact});\n\
                 .once {loaded}.discrepancy\n\
                 select count(*) from diffs_{alias};\n"
            )
        })
        .collect();

    ReconcilePlan { imports, blocks }
}

/// Renders a reconciliation-only script for a report whose exports
/// already exist on disk.
pub fn render_script(artifact: &str, datasets: &[Dataset]) -> String {
    let plan = plan(artifact, &format!("{artifact}.csv"), datasets);
    let mut script = String::new();
    script.push_str(&plan.imports.iter().join(""));
    script.push('\n');
    script.push_str(&plan.blocks.iter().join("\n"));
    script.push_str(".exit\n");
    script
}

pub fn execute(args: &ReconcileArgs) -> Result<()> {
    let cfg = ReportsCfg::load(&args.schema)?;
    let out_dir = resolve_out_dir(args.outdir.clone(), &cfg);
    let datasets = resolve_datasets(&args.datasets)?;

    let mut failures = 0usize;
    let resolved: Vec<_> = cfg.reports.iter().map(schema::resolve_report).collect();
    let reports: Vec<_> = resolved.iter().filter_map(|r| r.as_ref().ok()).cloned().collect();
    let conflicts = schema::detect_conflicts(&reports);
    for conflict in &conflicts {
        error!("{conflict}");
    }

    for outcome in &resolved {
        match outcome {
            Err(err) => {
                error!("{err}");
                failures += 1;
            }
            Ok(report) => {
                if assemble::is_conflicted(&report.artifact, &conflicts) {
                    failures += 1;
                    continue;
                }
                let script = render_script(&report.artifact, &datasets);
                let path = assemble::write_artifact(&out_dir, &report.artifact, &script)
                    .with_context(|| format!("Writing script for report '{}'", report.title))?;
                info!("Reconciliation script for '{}' written to {path:?}", report.title);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} report(s) failed", cfg.reports.len());
    }
    Ok(())
}

pub fn resolve_out_dir(cli_outdir: Option<PathBuf>, cfg: &ReportsCfg) -> PathBuf {
    cli_outdir
        .or_else(|| cfg.output_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}
