use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Compile report schemas into SQLite pivot scripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate one pivot + reconciliation script per report in a schema
    Generate(GenerateArgs),
    /// Generate reconciliation-only scripts for already exported reports
    Reconcile(ReconcileArgs),
    /// Validate a reports schema without writing any scripts
    Check(CheckArgs),
    /// Convert line-delimited JSON exports into CSV exports
    Transcode(TranscodeArgs),
}

/// Where the pivoted wide table is staged while the script runs.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum StagingMode {
    /// Anonymous in-memory database attached for the session
    Memory,
    /// On-disk staging database named after the report
    File,
}

impl Default for StagingMode {
    fn default() -> Self {
        StagingMode::Memory
    }
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Reports schema file (YAML)
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Directory for emitted scripts (overrides the schema's output_dir)
    #[arg(short = 'o', long = "outdir")]
    pub outdir: Option<PathBuf>,
    /// Staging database placement for the pivoted wide table
    #[arg(long, value_enum, default_value = "memory")]
    pub staging: StagingMode,
    /// Loadable SQLite module providing the coercion functions
    #[arg(long = "coercion-module", default_value = "dtformat")]
    pub coercion_module: String,
    /// Comparison datasets as `alias=file-suffix` (repeatable; defaults to
    /// the ese_csv and ese_json exports)
    #[arg(long = "dataset", action = clap::ArgAction::Append)]
    pub datasets: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Reports schema file (YAML)
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Directory for emitted scripts (overrides the schema's output_dir)
    #[arg(short = 'o', long = "outdir")]
    pub outdir: Option<PathBuf>,
    /// Comparison datasets as `alias=file-suffix` (repeatable)
    #[arg(long = "dataset", action = clap::ArgAction::Append)]
    pub datasets: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Reports schema file (YAML)
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
}

#[derive(Debug, Args)]
pub struct TranscodeArgs {
    /// One or more line-delimited JSON exports to convert
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Directory for the CSV outputs (defaults to each input's directory)
    #[arg(short = 'o', long = "outdir")]
    pub outdir: Option<PathBuf>,
}
