use anyhow::{Result, bail};
use log::{error, info};

use crate::assemble::SCRIPT_EXTENSION;
use crate::cli::CheckArgs;
use crate::pivot;
use crate::schema::{self, ReportsCfg};

/// Validates a schema the same way `generate` would, without writing
/// anything: per-column kinds, row identifier presence and uniqueness,
/// artifact-name conflicts.
pub fn execute(args: &CheckArgs) -> Result<()> {
    let cfg = ReportsCfg::load(&args.schema)?;
    if cfg.reports.is_empty() {
        return Err(crate::error::SchemaError::NoReports.into());
    }

    let mut failures = 0usize;
    let mut reports = Vec::with_capacity(cfg.reports.len());
    for report_cfg in &cfg.reports {
        match schema::resolve_report(report_cfg) {
            Ok(report) => {
                let active = report.columns.iter().filter(|c| c.is_active()).count();
                if let Err(err) = pivot::validate_row_id(&report, &cfg.row_id) {
                    error!("{err}");
                    failures += 1;
                    continue;
                }
                info!(
                    "report '{}' -> {}.{SCRIPT_EXTENSION} ({} column(s), {} active)",
                    report.title,
                    report.artifact,
                    report.columns.len(),
                    active
                );
                reports.push(report);
            }
            Err(err) => {
                error!("{err}");
                failures += 1;
            }
        }
    }

    let conflicts = schema::detect_conflicts(&reports);
    for conflict in &conflicts {
        error!("{conflict}");
        failures += 1;
    }

    if failures > 0 {
        bail!("Schema has {failures} problem(s)");
    }
    info!("{} report(s) validated", cfg.reports.len());
    Ok(())
}
