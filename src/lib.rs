pub mod assemble;
pub mod check;
pub mod cli;
pub mod error;
pub mod generate;
pub mod kind;
pub mod pivot;
pub mod reconcile;
pub mod schema;
pub mod transcode;
pub mod yaml_provider;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("eav_pivot", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => generate::execute(&args),
        Commands::Reconcile(args) => reconcile::execute(&args),
        Commands::Check(args) => check::execute(&args),
        Commands::Transcode(args) => transcode::execute(&args),
    }
}
