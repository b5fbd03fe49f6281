use config::{Config, Environment};
use log::debug;
use snafu::ResultExt;

use crate::cli::Cli;

use super::models::{ConfigError, EnvSettings, EnvironmentSnafu, Settings};

/// Flags first, then ENV vars, then defaults. PRINTER_IP, CYCLES, VERIFY and
/// POLL_INTERVAL are the recognized variables.
pub fn resolve_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    // As Rust has no native support for .env files,
    // we use the dotenv_flow crate to import to actual ENV vars.
    let dotenv_path = dotenv_flow::dotenv_flow();
    if let Ok(path) = dotenv_path {
        debug!("Loaded dotenv file: {:?}", path);
    }

    let env = load_env()?;
    Settings::resolve(cli, &env)
}

fn load_env() -> Result<EnvSettings, ConfigError> {
    let config = Config::builder()
        .add_source(Environment::default())
        .build()
        .context(EnvironmentSnafu)?;

    config.try_deserialize().context(EnvironmentSnafu)
}
