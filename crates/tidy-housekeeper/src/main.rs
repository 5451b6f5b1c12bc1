mod bootstrap_helpers;

use std::{io::Write, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tidy_cli::{resolve_housekeeper_settings, Cli, HousekeeperSettings};
use tidy_core::current_unix_timestamp;
use tidy_slack_runtime::{run_channel_sweep, SlackApiClient, SweepSummary, WorkspaceApi};
use tracing::{info, warn};

use crate::bootstrap_helpers::init_tracing;

const EXIT_SWEEP_FAILURES: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = resolve_housekeeper_settings(&cli)?;
    let fail_on_errors = settings.fail_on_errors;

    let summary = tokio::select! {
        summary = run_housekeeper(settings) => summary?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            bail!("sweep interrupted; tiers recorded up to the last completed page are kept");
        }
    };

    let rendered =
        serde_json::to_string_pretty(&summary).context("failed to render sweep summary")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").context("failed to write sweep summary")?;
    stdout.flush().context("failed to flush sweep summary")?;

    if let Some(code) = exit_code_for(&summary, fail_on_errors) {
        warn!(
            failures = summary.failures.len(),
            listing_error = summary.listing_error.is_some(),
            "sweep finished with failures"
        );
        std::process::exit(code);
    }
    Ok(())
}

async fn run_housekeeper(settings: HousekeeperSettings) -> Result<SweepSummary> {
    let client = settings.client;
    let api: Arc<dyn WorkspaceApi> = Arc::new(SlackApiClient::new(
        client.api_base,
        client.token,
        client.request_timeout_ms,
        client.retry_max_attempts,
        client.retry_base_delay_ms,
    )?);
    let now_unix = settings.now_unix.unwrap_or_else(current_unix_timestamp);
    info!(
        now_unix,
        dry_run = settings.runtime.dry_run,
        persistent = settings.runtime.state_dir.is_some(),
        "starting channel sweep"
    );
    run_channel_sweep(settings.runtime, api, now_unix).await
}

fn exit_code_for(summary: &SweepSummary, fail_on_errors: bool) -> Option<i32> {
    (fail_on_errors && summary.has_failures()).then_some(EXIT_SWEEP_FAILURES)
}
