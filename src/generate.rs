use anyhow::{Context, Result, bail};
use log::{error, info};

use crate::assemble::{self, ScriptOptions};
use crate::cli::GenerateArgs;
use crate::reconcile;
use crate::schema::{self, ReportsCfg};

pub fn execute(args: &GenerateArgs) -> Result<()> {
    let cfg = ReportsCfg::load(&args.schema)?;
    if cfg.reports.is_empty() {
        return Err(crate::error::SchemaError::NoReports.into());
    }
    let out_dir = reconcile::resolve_out_dir(args.outdir.clone(), &cfg);
    let datasets = reconcile::resolve_datasets(&args.datasets)?;
    let options = ScriptOptions {
        staging: args.staging,
        coercion_module: args.coercion_module.clone(),
    };

    // Conflicts are detected across the whole schema before anything is
    // written, so a colliding pair never silently overwrites one file.
    let resolved: Vec<_> = cfg.reports.iter().map(schema::resolve_report).collect();
    let reports: Vec<_> = resolved
        .iter()
        .filter_map(|outcome| outcome.as_ref().ok())
        .cloned()
        .collect();
    let conflicts = schema::detect_conflicts(&reports);
    for conflict in &conflicts {
        error!("{conflict}");
    }

    let mut failures = 0usize;
    for outcome in &resolved {
        let report = match outcome {
            Ok(report) => report,
            Err(err) => {
                error!("{err}");
                failures += 1;
                continue;
            }
        };
        if assemble::is_conflicted(&report.artifact, &conflicts) {
            failures += 1;
            continue;
        }
        let script = match assemble::compose(report, &cfg.row_id, &cfg.table_sql, &options, &datasets)
        {
            Ok(script) => script,
            Err(err) => {
                error!("{err}");
                failures += 1;
                continue;
            }
        };
        let path = assemble::write_artifact(&out_dir, &report.artifact, &script)
            .with_context(|| format!("Writing script for report '{}'", report.title))?;
        info!("Script for '{}' written to {path:?}", report.title);
    }

    if failures > 0 {
        bail!("{failures} of {} report(s) failed", cfg.reports.len());
    }
    Ok(())
}
