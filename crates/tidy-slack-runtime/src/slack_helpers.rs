use std::time::Duration;

pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

pub(crate) fn retry_delay(
    base_delay_ms: u64,
    attempt: usize,
    retry_after_seconds: Option<u64>,
) -> Duration {
    if let Some(retry_after_seconds) = retry_after_seconds {
        return Duration::from_secs(retry_after_seconds);
    }
    let exponent = attempt.saturating_sub(1).min(6) as u32;
    let scale = 2_u64.pow(exponent);
    Duration::from_millis(base_delay_ms.max(1).saturating_mul(scale))
}

pub(crate) fn is_retryable_slack_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

pub(crate) fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
}

/// Slack `error` codes that mean the token cannot perform the call.
pub(crate) fn is_authorization_error_code(code: &str) -> bool {
    matches!(
        code,
        "not_authed"
            | "invalid_auth"
            | "account_inactive"
            | "token_revoked"
            | "token_expired"
            | "no_permission"
            | "missing_scope"
            | "not_allowed_token_type"
            | "ekm_access_denied"
    )
}

pub(crate) fn truncate_for_error(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = String::new();
    for ch in value.chars().take(max_chars) {
        truncated.push(ch);
    }
    truncated.push_str("...");
    truncated
}

/// Parses a Slack message `ts` ("1700000000.000100") into whole unix seconds.
pub(crate) fn parse_slack_ts(ts: &str) -> Option<u64> {
    let seconds = ts.trim().split('.').next()?;
    if seconds.is_empty() {
        return None;
    }
    seconds.parse::<u64>().ok()
}

/// Normalizes a channel reference for exemption matching (`#general` == `general`).
pub(crate) fn normalize_channel_ref(raw: &str) -> String {
    raw.trim().trim_start_matches('#').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{
        is_authorization_error_code, is_retryable_slack_status, normalize_channel_ref,
        parse_retry_after, parse_slack_ts, retry_delay, truncate_for_error,
    };
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
    use std::time::Duration;

    #[test]
    fn unit_parse_retry_after_accepts_numeric_and_rejects_invalid_values() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("15"));
        assert_eq!(parse_retry_after(&headers), Some(15));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("invalid"));
        assert_eq!(parse_retry_after(&headers), None);

        let empty = HeaderMap::new();
        assert_eq!(parse_retry_after(&empty), None);
    }

    #[test]
    fn unit_retry_delay_prefers_retry_after_and_uses_exponential_backoff() {
        assert_eq!(retry_delay(50, 1, Some(3)), Duration::from_secs(3));
        assert_eq!(retry_delay(100, 1, None), Duration::from_millis(100));
        assert_eq!(retry_delay(100, 2, None), Duration::from_millis(200));
        assert_eq!(retry_delay(100, 3, None), Duration::from_millis(400));
        assert_eq!(retry_delay(100, 30, None), Duration::from_millis(6_400));
    }

    #[test]
    fn unit_is_retryable_slack_status_handles_rate_limit_and_server_errors() {
        assert!(is_retryable_slack_status(429));
        assert!(is_retryable_slack_status(500));
        assert!(is_retryable_slack_status(503));
        assert!(!is_retryable_slack_status(400));
        assert!(!is_retryable_slack_status(404));
    }

    #[test]
    fn unit_authorization_error_codes_are_recognized() {
        assert!(is_authorization_error_code("invalid_auth"));
        assert!(is_authorization_error_code("missing_scope"));
        assert!(!is_authorization_error_code("channel_not_found"));
        assert!(!is_authorization_error_code("already_archived"));
    }

    #[test]
    fn unit_parse_slack_ts_keeps_whole_seconds() {
        assert_eq!(parse_slack_ts("1700000000.000100"), Some(1_700_000_000));
        assert_eq!(parse_slack_ts("1700000000"), Some(1_700_000_000));
        assert_eq!(parse_slack_ts(""), None);
        assert_eq!(parse_slack_ts(".5"), None);
        assert_eq!(parse_slack_ts("abc.1"), None);
    }

    #[test]
    fn regression_truncate_for_error_preserves_unicode_boundaries() {
        let value = "chånnel-🌊-notice";
        assert_eq!(truncate_for_error(value, 40), value);
        assert_eq!(truncate_for_error(value, 3), "chå...");
        assert_eq!(truncate_for_error(value, 0), "...");
    }

    #[test]
    fn unit_normalize_channel_ref_strips_hash_and_case() {
        assert_eq!(normalize_channel_ref("#Housekeeping"), "housekeeping");
        assert_eq!(normalize_channel_ref(" C0123 "), "c0123");
    }
}
