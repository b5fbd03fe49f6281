use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use crate::cleaning::run_cycles;
use crate::cli::Cli;
use crate::config::models::Settings;
use crate::ledm_client::client::LedmClient;

mod cleaning;
mod cli;
mod config;
mod ledm_client;

fn main() -> ExitCode {
    colog::init();

    let cli = Cli::parse();
    let settings = match crate::config::loading::resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    announce_defaults();

    match run(&settings) {
        Ok(()) => {
            info!("All requested cycles finished.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error running cleaning cycles: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<()> {
    let printer = LedmClient::new(&settings.printer, settings.poll_interval)?;
    run_cycles(&printer, settings.cycles, settings.verify)
}

/// A bare invocation (printer address from the environment, nothing else)
/// gets a hint about what it is going to do.
fn announce_defaults() {
    if std::env::args_os().len() == 1 && std::env::var_os("CYCLES").is_none() {
        info!("Defaulting to one cleaning cycle, no verification sheet.");
    }
}
