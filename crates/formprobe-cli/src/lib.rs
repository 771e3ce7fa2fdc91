//! formprobe CLI: command-line front end for the form probe
//!
//! ```bash
//! formprobe                      # visible browser, wait for a key at the end
//! formprobe --headless --no-pause
//! RUST_LOG=formprobe=debug formprobe -v
//! ```

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod logging;
mod output;
mod runner;

pub use commands::{Cli, ColorArg};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::ConsoleReporter;
pub use runner::{run, run_session};
