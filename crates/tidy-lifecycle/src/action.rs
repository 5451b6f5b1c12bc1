//! Externally visible side effects the policy can request.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatorNotice {
    Warning,
    FinalNotice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelNotice {
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousekeepingEvent {
    Warned,
    ArchivePending,
    Archived,
    Removed,
}

impl HousekeepingEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warned => "warned",
            Self::ArchivePending => "archive_pending",
            Self::Archived => "archived",
            Self::Removed => "removed",
        }
    }
}

/// One side effect scoped to the channel of the enclosing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "notice", rename_all = "snake_case")]
pub enum Action {
    NotifyCreator(CreatorNotice),
    NotifyHousekeeping(HousekeepingEvent),
    ArchiveChannel,
    NotifyChannel(ChannelNotice),
    DeleteChannel,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotifyCreator(_) => "notify_creator",
            Self::NotifyHousekeeping(_) => "notify_housekeeping",
            Self::ArchiveChannel => "archive_channel",
            Self::NotifyChannel(_) => "notify_channel",
            Self::DeleteChannel => "delete_channel",
        }
    }

    /// Mandatory actions gate their dependents and the tier they belong to.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Self::ArchiveChannel | Self::DeleteChannel)
    }

    /// Notifications only talk about state; they never change it.
    pub fn is_notification(&self) -> bool {
        !self.is_mandatory()
    }

    /// Tier the channel is known to be in once this action succeeds, if any.
    pub fn confirms_tier(&self) -> Option<Tier> {
        match self {
            Self::ArchiveChannel => Some(Tier::Archived),
            Self::DeleteChannel => Some(Tier::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotifyHousekeeping(event) => write!(f, "{}({})", self.label(), event.as_str()),
            _ => f.write_str(self.label()),
        }
    }
}
