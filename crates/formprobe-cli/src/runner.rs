//! Session lifetime: launch, probe, pause, close

use formprobe::{timestamp, FormProbe, ProbeDriver, RunSummary};
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ConsoleReporter;

/// Run the full probe once against a freshly launched browser.
///
/// Only a failed launch is an error. Check failures are part of the
/// returned summary.
#[cfg(feature = "browser")]
pub async fn run(config: &CliConfig) -> CliResult<RunSummary> {
    let driver = formprobe::ChromiumDriver::launch(&config.chromium).await?;
    let reporter = ConsoleReporter::new(
        config.color.should_color(),
        config.verbosity.is_quiet(),
    );
    let (_, summary) = run_session(driver, config, reporter).await;
    Ok(summary)
}

/// Built without a browser backend
#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
pub async fn run(_config: &CliConfig) -> CliResult<RunSummary> {
    Err(CliError::config(
        "formprobe was built without the `browser` feature",
    ))
}

/// Probe through an open driver, then close it whatever the outcome.
///
/// Prints the footer, waits for a key when `config.pause` is set, and hands
/// the closed driver back with the summary.
pub async fn run_session<D: ProbeDriver>(
    driver: D,
    config: &CliConfig,
    reporter: ConsoleReporter,
) -> (D, RunSummary) {
    let mut probe = FormProbe::new(driver, config.probe.clone(), reporter);
    probe.run().await;
    let (mut driver, reporter, summary) = probe.into_parts();

    let finished_at = summary.finished_at.unwrap_or(summary.started_at);
    reporter.finished(&timestamp(&finished_at));
    info!(
        passed = summary.passed,
        failed = summary.failed,
        elapsed_ms = summary.elapsed().num_milliseconds(),
        "run complete"
    );

    if config.pause {
        reporter.prompt();
        if let Err(e) = wait_for_key().await {
            warn!(error = %e, "could not read key press");
        }
    }

    if let Err(e) = driver.close().await {
        warn!(error = %e, "browser did not close cleanly");
    }
    (driver, summary)
}

async fn wait_for_key() -> CliResult<()> {
    let key = tokio::task::spawn_blocking(|| console::Term::stdout().read_key())
        .await
        .map_err(|e| CliError::config(format!("key reader stopped: {e}")))?;
    key?;
    Ok(())
}
