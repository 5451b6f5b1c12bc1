use std::path::PathBuf;

use clap::{ArgAction, Parser};

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "tidy-housekeeper",
    about = "Warns about, archives, and deletes inactive Slack channels",
    version
)]
pub struct Cli {
    #[arg(
        long = "slack-token",
        env = "HOUSEKEEPER_SLACK_TOKEN",
        hide_env_values = true,
        help = "Slack token with channels, chat, and admin.conversations scopes (xoxp-... or xoxb-...)"
    )]
    pub slack_token: Option<String>,

    #[arg(
        long = "slack-api-base",
        env = "HOUSEKEEPER_SLACK_API_BASE",
        default_value = "https://slack.com/api",
        help = "Slack Web API base URL"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "state-dir",
        env = "HOUSEKEEPER_STATE_DIR",
        default_value = ".tidy/housekeeper",
        help = "Directory for the tier store and action log"
    )]
    pub state_dir: PathBuf,

    #[arg(
        long = "no-state",
        env = "HOUSEKEEPER_NO_STATE",
        default_value_t = false,
        help = "Keep tiers in memory only; every sweep re-notifies channels past each threshold"
    )]
    pub no_state: bool,

    #[arg(
        long = "housekeeping-channel",
        env = "HOUSEKEEPER_HOUSEKEEPING_CHANNEL",
        default_value = "#housekeeping",
        help = "Channel receiving administrative notices; always exempt from housekeeping"
    )]
    pub housekeeping_channel: String,

    #[arg(
        long = "warn-after-hours",
        env = "HOUSEKEEPER_WARN_AFTER_HOURS",
        default_value_t = 21 * 24,
        value_parser = parse_positive_u64,
        help = "Inactivity after which the channel creator is warned"
    )]
    pub warn_after_hours: u64,

    #[arg(
        long = "archive-after-hours",
        env = "HOUSEKEEPER_ARCHIVE_AFTER_HOURS",
        default_value_t = 30 * 24,
        value_parser = parse_positive_u64,
        help = "Inactivity after which the channel is archived"
    )]
    pub archive_after_hours: u64,

    #[arg(
        long = "delete-after-hours",
        env = "HOUSEKEEPER_DELETE_AFTER_HOURS",
        default_value_t = 90 * 24,
        value_parser = parse_positive_u64,
        help = "Time since archival after which the channel is deleted"
    )]
    pub delete_after_hours: u64,

    #[arg(
        long = "final-notice-lead-hours",
        env = "HOUSEKEEPER_FINAL_NOTICE_LEAD_HOURS",
        value_parser = parse_positive_u64,
        help = "Send a final notice this many hours before archiving (disabled when unset)"
    )]
    pub final_notice_lead_hours: Option<u64>,

    #[arg(
        long = "exempt-channel",
        env = "HOUSEKEEPER_EXEMPT_CHANNELS",
        value_delimiter = ',',
        action = ArgAction::Append,
        help = "Channel id or name never acted on (repeatable, comma-separated in env)"
    )]
    pub exempt_channels: Vec<String>,

    #[arg(
        long = "concurrency",
        env = "HOUSEKEEPER_CONCURRENCY",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Maximum channels processed concurrently within a directory page"
    )]
    pub concurrency: usize,

    #[arg(
        long = "request-timeout-ms",
        env = "HOUSEKEEPER_REQUEST_TIMEOUT_MS",
        default_value_t = 15_000,
        value_parser = parse_positive_u64,
        help = "Timeout for each Slack API request"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "HOUSEKEEPER_RETRY_MAX_ATTEMPTS",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Maximum attempts for retryable slack api failures (429/5xx/transport)"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "HOUSEKEEPER_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        value_parser = parse_positive_u64,
        help = "Base backoff delay in milliseconds for slack api retries"
    )]
    pub retry_base_delay_ms: u64,

    #[arg(
        long = "dry-run",
        env = "HOUSEKEEPER_DRY_RUN",
        default_value_t = false,
        help = "Log and summarize planned actions without posting, archiving, deleting, or writing tiers"
    )]
    pub dry_run: bool,

    #[arg(
        long = "now-unix",
        env = "HOUSEKEEPER_NOW_UNIX",
        value_parser = parse_positive_u64,
        help = "Override the sweep clock (unix seconds)"
    )]
    pub now_unix: Option<u64>,

    #[arg(
        long = "fail-on-errors",
        env = "HOUSEKEEPER_FAIL_ON_ERRORS",
        default_value_t = false,
        help = "Exit non-zero when the sweep reports any channel failure or listing error"
    )]
    pub fail_on_errors: bool,
}
