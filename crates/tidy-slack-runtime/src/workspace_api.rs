//! Contract between the sweep and the messaging workspace it manages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slack_helpers::parse_slack_ts;

/// Directory entry / channel info as returned by `conversations.list` and
/// `conversations.info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMeta {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub is_general: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelPage {
    pub channels: Vec<ChannelMeta>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    #[serde(default)]
    pub text: String,
    pub ts: String,
}

impl LastMessage {
    pub fn timestamp_unix(&self) -> Option<u64> {
        parse_slack_ts(&self.ts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceApiError {
    #[error("slack api {operation} rate limited after {attempts} attempts")]
    RateLimited {
        operation: String,
        attempts: usize,
        retry_after_secs: Option<u64>,
    },
    #[error("slack api {operation} not authorized: {code}")]
    Unauthorized { operation: String, code: String },
    #[error("slack api {operation} request failed after {attempts} attempts: {message}")]
    Transport {
        operation: String,
        attempts: usize,
        message: String,
    },
    #[error("slack api {operation} failed with status {status}: {body}")]
    HttpStatus {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("slack api {operation} failed: {code}")]
    Rejected { operation: String, code: String },
    #[error("slack api {operation} returned an invalid response: {message}")]
    InvalidResponse { operation: String, message: String },
}

impl WorkspaceApiError {
    /// True when repeating the call later may succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => (500..600).contains(status),
            Self::Unauthorized { .. } | Self::Rejected { .. } | Self::InvalidResponse { .. } => {
                false
            }
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Transport { .. } => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Rejected { .. } => "rejected",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }
}

/// Workspace operations the sweep depends on. Implementations retry
/// rate-limited and transient failures themselves and bound every call with a
/// timeout; an `Err` is final for that call.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    async fn list_channels(&self, cursor: Option<&str>) -> Result<ChannelPage, WorkspaceApiError>;

    async fn channel_info(&self, channel_id: &str) -> Result<ChannelMeta, WorkspaceApiError>;

    async fn last_message(&self, channel_id: &str)
        -> Result<Option<LastMessage>, WorkspaceApiError>;

    async fn post_message(&self, target: &str, text: &str) -> Result<(), WorkspaceApiError>;

    async fn archive_channel(&self, channel_id: &str) -> Result<(), WorkspaceApiError>;

    async fn delete_channel(&self, channel_id: &str) -> Result<(), WorkspaceApiError>;
}

#[cfg(test)]
mod tests {
    use super::{ChannelMeta, LastMessage, WorkspaceApiError};

    #[test]
    fn unit_channel_meta_decodes_slack_channel_object_with_defaults() {
        let meta: ChannelMeta = serde_json::from_value(serde_json::json!({
            "id": "C1",
            "name": "project-x",
            "created": 1_700_000_000_u64,
            "creator": "U1",
            "is_channel": true,
            "topic": {"value": "ignored"}
        }))
        .expect("decode");
        assert_eq!(meta.id, "C1");
        assert_eq!(meta.creator.as_deref(), Some("U1"));
        assert!(!meta.is_archived);
        assert!(!meta.is_member);
        assert!(!meta.is_general);
    }

    #[test]
    fn unit_last_message_timestamp_parses_slack_ts() {
        let message = LastMessage {
            text: "hello".to_string(),
            ts: "1700000123.000200".to_string(),
        };
        assert_eq!(message.timestamp_unix(), Some(1_700_000_123));
    }

    #[test]
    fn unit_error_retryability_distinguishes_permanent_failures() {
        let rate_limited = WorkspaceApiError::RateLimited {
            operation: "chat.postMessage".to_string(),
            attempts: 3,
            retry_after_secs: Some(1),
        };
        assert!(rate_limited.is_retryable());
        assert!(rate_limited.is_rate_limited());
        let server = WorkspaceApiError::HttpStatus {
            operation: "conversations.list".to_string(),
            status: 503,
            body: String::new(),
        };
        assert!(server.is_retryable());
        let rejected = WorkspaceApiError::Rejected {
            operation: "conversations.archive".to_string(),
            code: "cant_archive_general".to_string(),
        };
        assert!(!rejected.is_retryable());
        assert_eq!(rejected.kind(), "rejected");
        assert_eq!(
            rejected.to_string(),
            "slack api conversations.archive failed: cant_archive_general"
        );
    }
}
