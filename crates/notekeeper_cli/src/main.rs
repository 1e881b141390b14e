//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `notekeeper_core` linkage and store bootstrap end to end.
//! - Print the report summary of a store as JSON.
//!
//! Usage: `notekeeper [config.json]`. Without a config an empty in-memory
//! store is opened.

use log::info;
use notekeeper_core::{
    core_version, init_logging_from_config, open_store, schema_version, AppConfig,
    ReportAggregator,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("notekeeper: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    init_logging_from_config(&config.logging)?;

    let conn = open_store(&config.store)?;
    let summary = ReportAggregator::try_new(&conn)?.summary()?;
    info!(
        "event=cli_report module=cli status=ok total={}",
        summary.total
    );

    println!("notekeeper_core version={}", core_version());
    println!("schema_version={}", schema_version(&conn)?);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
