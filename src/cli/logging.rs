//! Logging utilities for CLI output
//!
//! User-facing text goes through [`log`]; diagnostic events go through
//! `tracing`, configured once by [`init_tracing`].

use tracing_subscriber::EnvFilter;

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            LogLevel::Quiet
        } else if verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }

    /// Default `tracing` directive when `RUST_LOG` is unset
    pub fn default_directive(self) -> &'static str {
        match self {
            LogLevel::Quiet => "credit_pipeline=warn",
            LogLevel::Normal => "credit_pipeline=info",
            LogLevel::Verbose => "credit_pipeline=debug",
        }
    }
}

/// Whether a message needing `required` is shown at `level`
pub fn should_print(level: LogLevel, required: LogLevel) -> bool {
    level != LogLevel::Quiet && (level == required || required == LogLevel::Normal)
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if should_print(level, required) {
        println!("{msg}");
    }
}

/// Install the stderr `tracing` subscriber; `RUST_LOG` wins over `level`
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.default_directive()));
    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
