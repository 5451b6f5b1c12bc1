use anyhow::{bail, Context, Result};
use tidy_core::SECONDS_PER_HOUR;
use tidy_lifecycle::LifecyclePolicy;
use tidy_slack_runtime::SweepRuntimeConfig;

use crate::Cli;

/// Slack client construction parameters resolved from the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackClientSettings {
    pub api_base: String,
    pub token: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct HousekeeperSettings {
    pub runtime: SweepRuntimeConfig,
    pub client: SlackClientSettings,
    pub now_unix: Option<u64>,
    pub fail_on_errors: bool,
}

pub fn resolve_housekeeper_settings(cli: &Cli) -> Result<HousekeeperSettings> {
    let token = cli
        .slack_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);
    let Some(token) = token else {
        bail!("--slack-token (or HOUSEKEEPER_SLACK_TOKEN) is required");
    };

    let housekeeping_channel = cli.housekeeping_channel.trim();
    if housekeeping_channel.trim_start_matches('#').is_empty() {
        bail!("--housekeeping-channel cannot be empty");
    }

    Ok(HousekeeperSettings {
        runtime: SweepRuntimeConfig {
            policy: lifecycle_policy_from_cli(cli)?,
            housekeeping_channel: housekeeping_channel.to_string(),
            exempt_channels: cli
                .exempt_channels
                .iter()
                .map(|channel| channel.trim().to_string())
                .filter(|channel| !channel.is_empty())
                .collect(),
            concurrency: cli.concurrency,
            dry_run: cli.dry_run,
            state_dir: (!cli.no_state).then(|| cli.state_dir.clone()),
        },
        client: SlackClientSettings {
            api_base: cli.slack_api_base.trim().to_string(),
            token,
            request_timeout_ms: cli.request_timeout_ms,
            retry_max_attempts: cli.retry_max_attempts,
            retry_base_delay_ms: cli.retry_base_delay_ms,
        },
        now_unix: cli.now_unix,
        fail_on_errors: cli.fail_on_errors,
    })
}

pub fn lifecycle_policy_from_cli(cli: &Cli) -> Result<LifecyclePolicy> {
    let final_notice_lead_secs = cli
        .final_notice_lead_hours
        .map(|hours| hours_to_secs("--final-notice-lead-hours", hours))
        .transpose()?;
    LifecyclePolicy::new(
        hours_to_secs("--warn-after-hours", cli.warn_after_hours)?,
        hours_to_secs("--archive-after-hours", cli.archive_after_hours)?,
        hours_to_secs("--delete-after-hours", cli.delete_after_hours)?,
        final_notice_lead_secs,
    )
    .context("invalid lifecycle thresholds")
}

fn hours_to_secs(flag: &str, hours: u64) -> Result<u64> {
    hours
        .checked_mul(SECONDS_PER_HOUR)
        .with_context(|| format!("{flag} value {hours} is too large"))
}
