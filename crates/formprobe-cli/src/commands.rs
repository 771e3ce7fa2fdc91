//! CLI argument definitions using clap

use clap::{Parser, ValueEnum};
use formprobe::DEFAULT_TARGET_URL;
use std::path::PathBuf;

/// formprobe: probe a practice form through Chromium with selector and
/// script fallbacks
///
/// With no flags, runs every check against the CloudQA practice form in a
/// visible browser window, prints the report and waits for a key press
/// before closing the browser.
#[derive(Parser, Debug)]
#[command(name = "formprobe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run Chromium without a window
    #[arg(long, env = "FORMPROBE_HEADLESS")]
    pub headless: bool,

    /// Chromium executable (found automatically when unset)
    #[arg(long, env = "CHROMIUM_PATH", value_name = "PATH")]
    pub chromium_path: Option<PathBuf>,

    /// Page to probe
    #[arg(long, env = "FORMPROBE_URL", default_value = DEFAULT_TARGET_URL)]
    pub url: String,

    /// Close the browser as soon as the run ends instead of waiting for a key
    #[arg(long)]
    pub no_pause: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only failures and warnings)
    #[arg(short, long)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorArg,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
