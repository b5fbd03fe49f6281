use std::time::Duration;

use serde_derive::Deserialize;
use snafu::{ensure, OptionExt, Snafu};

use crate::cli::Cli;

// When changing anything here, make sure the field names still line up with
// the ENV var names read in loading.rs (keys are lowercased there).

/// Raw values read from the environment. Flags win over these in resolve().
#[derive(Debug, Deserialize)]
pub struct EnvSettings {
    pub printer_ip: Option<String>,
    pub cycles: Option<u8>,
    pub verify: Option<bool>,
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for EnvSettings {
    fn default() -> Self {
        EnvSettings {
            printer_ip: None,
            cycles: None,
            verify: None,
            poll_interval: default_poll_interval(),
        }
    }
}

/// Effective configuration for one run.
#[derive(Debug)]
pub struct Settings {
    pub printer: String,
    pub cycles: u8,
    pub verify: bool,
    pub poll_interval: Duration,
}

impl Settings {
    /// The printer address must come from the flag or the environment; the
    /// rest has defaults. Cycle counts outside 1..=3 are rejected here so
    /// env-provided values get the same contract the flag has.
    pub fn resolve(cli: &Cli, env: &EnvSettings) -> Result<Settings, ConfigError> {
        let printer = cli
            .printer
            .as_deref()
            .or(env.printer_ip.as_deref())
            .context(NoPrinterAddressSnafu)?
            .to_string();
        let cycles = cli.cycles.or(env.cycles).unwrap_or(1);
        ensure!((1..=3).contains(&cycles), CyclesOutOfRangeSnafu { cycles });
        Ok(Settings {
            printer,
            cycles,
            verify: cli.verify || env.verify.unwrap_or(false),
            poll_interval: env.poll_interval,
        })
    }
}

// ////// //
// Errors //
// ////// //

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("no printer address, pass --printer or set PRINTER_IP"))]
    NoPrinterAddress,

    #[snafu(display("cycle count must be 1, 2 or 3, got {cycles}"))]
    CyclesOutOfRange { cycles: u8 },

    #[snafu(display("could not read environment configuration: {source}"))]
    Environment { source: config::ConfigError },
}
