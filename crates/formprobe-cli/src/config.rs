//! CLI configuration

use formprobe::{ChromiumConfig, ProbeConfig};
use serde::{Deserialize, Serialize};

use crate::commands::Cli;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - failures and warnings only
    Quiet,
    /// Normal - the full report
    #[default]
    Normal,
    /// Verbose - report plus info logs
    Verbose,
    /// Debug - report plus every locator attempt and fallback
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "formprobe=debug,formprobe_cli=debug,info",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Wait for a key press before closing the browser
    pub pause: bool,
    /// Browser launch settings
    pub chromium: ChromiumConfig,
    /// Probe settings
    pub probe: ProbeConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            pause: true,
            chromium: ChromiumConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build configuration from parsed arguments
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let mut chromium = ChromiumConfig::new().with_headless(cli.headless);
        if let Some(ref path) = cli.chromium_path {
            chromium = chromium.with_chromium_path(path.clone());
        }
        Self::new()
            .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
            .with_color(cli.color.into())
            .with_pause(!cli.no_pause)
            .with_chromium(chromium)
            .with_probe(ProbeConfig::new().with_target_url(cli.url.clone()))
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set whether to wait for a key press
    #[must_use]
    pub const fn with_pause(mut self, pause: bool) -> Self {
        self.pause = pause;
        self
    }

    /// Set browser launch settings
    #[must_use]
    pub fn with_chromium(mut self, chromium: ChromiumConfig) -> Self {
        self.chromium = chromium;
        self
    }

    /// Set probe settings
    #[must_use]
    pub fn with_probe(mut self, probe: ProbeConfig) -> Self {
        self.probe = probe;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
            assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
        }

        #[test]
        fn test_is_verbose() {
            assert!(!Verbosity::Quiet.is_verbose());
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Verbose.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
        }

        #[test]
        fn test_log_directive_keeps_stderr_quiet_by_default() {
            assert_eq!(Verbosity::Normal.log_directive(), "warn");
            assert!(Verbosity::Debug.log_directive().contains("formprobe=debug"));
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_explicit_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod cli_config_tests {
        use super::*;

        #[test]
        fn test_default_pauses_with_visible_browser() {
            let config = CliConfig::default();
            assert!(config.pause);
            assert!(!config.chromium.headless);
            assert_eq!(config.probe, ProbeConfig::default());
        }

        #[test]
        fn test_from_cli() {
            let cli = Cli::try_parse_from([
                "formprobe",
                "--headless",
                "--no-pause",
                "-q",
                "--chromium-path",
                "/usr/bin/chromium",
                "--url",
                "http://localhost:3000",
            ])
            .unwrap();
            let config = CliConfig::from_cli(&cli);

            assert!(config.chromium.headless);
            assert!(!config.pause);
            assert!(config.verbosity.is_quiet());
            assert!(config.chromium.chromium_path.is_some());
            assert_eq!(config.probe.target_url, "http://localhost:3000");
            assert_eq!(config.probe.first_name, "CloudQA");
        }
    }
}
