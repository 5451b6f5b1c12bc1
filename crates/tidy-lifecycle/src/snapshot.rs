//! Per-sweep channel observations.

use serde::{Deserialize, Serialize};

/// Which auxiliary lookup failed while building a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    ChannelInfo,
    LastMessage,
}

impl LookupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChannelInfo => "channel_info",
            Self::LastMessage => "last_message",
        }
    }
}

/// A failed auxiliary lookup; the corresponding snapshot field is left unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupFailure {
    pub kind: LookupKind,
    pub rate_limited: bool,
    pub reason: String,
}

/// Immutable observation of one channel taken during one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub channel_id: String,
    pub name: String,
    /// `None` means the creator lookup failed, not that the channel has no creator.
    pub creator_id: Option<String>,
    pub is_member: bool,
    pub is_general: bool,
    pub created_at: u64,
    pub is_archived: bool,
    /// `None` means no message history could be retrieved.
    pub last_message_at: Option<u64>,
    #[serde(default)]
    pub lookup_failures: Vec<LookupFailure>,
}

impl ChannelSnapshot {
    pub fn has_lookup_failures(&self) -> bool {
        !self.lookup_failures.is_empty()
    }
}
