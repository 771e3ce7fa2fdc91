//! Diagnostic logging setup.
//!
//! Logs go to stderr so the report on stdout stays readable. `RUST_LOG`
//! overrides the level chosen by `-q`/`-v`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Verbosity;
use crate::error::{CliError, CliResult};

/// Install the global subscriber
pub fn init_logging(verbosity: Verbosity, use_color: bool) -> CliResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(verbosity.is_verbose())
                .with_thread_ids(false)
                .with_ansi(use_color)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| CliError::config(format!("Failed to initialize logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_parse() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::Verbose,
            Verbosity::Debug,
        ] {
            assert!(EnvFilter::try_new(verbosity.log_directive()).is_ok());
        }
    }
}
