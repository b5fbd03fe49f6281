use clap::Parser;

// ///////////// //
// CLI interface //
// ///////////// //

/// tankclean - Runs 1-3 Smart Tank head-cleaning cycles over the printer's embedded web interface, optionally printing a verification sheet after each cycle.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Printer IP address or hostname (falls back to the PRINTER_IP env var).
    #[arg(long)]
    pub printer: Option<String>,

    /// Number of cleaning cycles to run (falls back to the CYCLES env var).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub cycles: Option<u8>,

    /// Print a verification sheet after every cycle (falls back to the VERIFY env var).
    #[arg(long)]
    pub verify: bool,
}
