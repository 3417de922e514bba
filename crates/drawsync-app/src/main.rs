//! Main application entry point.

use clap::Parser;
use drawsync_app::{App, AppOptions};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let options = AppOptions::parse();

    log::info!("Starting drawsync");
    match App::run(&options) {
        Ok(summary) => {
            log::info!(
                "Replayed {} actions, {} history entries, {} remote operations",
                summary.actions,
                summary.history_len,
                summary.remote_applied
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("drawsync: {}", e);
            ExitCode::FAILURE
        }
    }
}
