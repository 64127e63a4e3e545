//! Configuration and CLI argument handling

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "roundbell")]
#[command(about = "A drift-corrected countdown timer for training rounds")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Round duration in seconds (defaults to the last saved duration)
    #[arg(short, long)]
    pub round: Option<u64>,

    /// Path of the settings file
    #[arg(long, default_value = "roundbell-settings.json")]
    pub settings: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Requested round duration in milliseconds, if one was given
    pub fn round_time_ms(&self) -> Option<u64> {
        self.round.map(|secs| secs * 1_000)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
