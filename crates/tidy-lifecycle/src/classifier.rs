//! Maps a channel snapshot and the sweep clock to a lifecycle tier.

use tidy_core::elapsed_seconds;

use crate::{ChannelSnapshot, LifecyclePolicy, Tier};

#[derive(Debug, Clone)]
pub struct InactivityClassifier {
    policy: LifecyclePolicy,
}

impl InactivityClassifier {
    pub fn new(policy: LifecyclePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Classifies a snapshot whose archival time is unknown.
    pub fn classify(&self, snapshot: &ChannelSnapshot, now_unix: u64) -> Tier {
        self.classify_with_archival(snapshot, None, now_unix)
    }

    /// Classifies a snapshot; `archived_at` is the archival time recorded by a
    /// previous sweep and replaces `created_at` as the deletion reference.
    pub fn classify_with_archival(
        &self,
        snapshot: &ChannelSnapshot,
        archived_at: Option<u64>,
        now_unix: u64,
    ) -> Tier {
        if snapshot.is_archived {
            let reference = archived_at.unwrap_or(snapshot.created_at);
            return self.tier_for_archived_age(elapsed_seconds(reference, now_unix));
        }
        let inactive_secs = snapshot
            .last_message_at
            .map(|last_message_at| elapsed_seconds(last_message_at, now_unix))
            .unwrap_or(u64::MAX);
        self.tier_for_inactivity(inactive_secs)
    }

    /// Tier of an unarchived channel that has been silent for `inactive_secs`.
    pub fn tier_for_inactivity(&self, inactive_secs: u64) -> Tier {
        if inactive_secs >= self.policy.archive_after_secs {
            return Tier::Archived;
        }
        if let Some(final_notice_after_secs) = self.policy.final_notice_after_secs() {
            if inactive_secs >= final_notice_after_secs {
                return Tier::ArchivePendingNotified;
            }
        }
        if inactive_secs >= self.policy.warn_after_secs {
            return Tier::Warned;
        }
        Tier::Active
    }

    /// Tier of an archived channel archived (or created) `archived_secs` ago.
    pub fn tier_for_archived_age(&self, archived_secs: u64) -> Tier {
        if archived_secs >= self.policy.delete_after_secs {
            Tier::DeletionEligible
        } else {
            Tier::Archived
        }
    }

    /// Seconds left until an unarchived channel reaches the archive threshold.
    pub fn time_until_archive(&self, snapshot: &ChannelSnapshot, now_unix: u64) -> u64 {
        let inactive_secs = snapshot
            .last_message_at
            .map(|last_message_at| elapsed_seconds(last_message_at, now_unix))
            .unwrap_or(u64::MAX);
        self.policy.archive_after_secs.saturating_sub(inactive_secs)
    }
}
