//! Ordered lifecycle tiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a channel, ordered by escalating severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Active,
    Warned,
    ArchivePendingNotified,
    Archived,
    DeletionEligible,
    Deleted,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Active,
        Tier::Warned,
        Tier::ArchivePendingNotified,
        Tier::Archived,
        Tier::DeletionEligible,
        Tier::Deleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Warned => "warned",
            Self::ArchivePendingNotified => "archive_pending_notified",
            Self::Archived => "archived",
            Self::DeletionEligible => "deletion_eligible",
            Self::Deleted => "deleted",
        }
    }

    /// Tiers strictly after `self` up to and including `target`, in severity order.
    pub fn crossed_until(self, target: Tier) -> impl Iterator<Item = Tier> {
        Self::ALL
            .into_iter()
            .filter(move |tier| *tier > self && *tier <= target)
    }

    /// True for tiers in which the channel is archived (or gone).
    pub fn is_archived_branch(self) -> bool {
        self >= Self::Archived
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Tier;

    #[test]
    fn unit_tiers_are_strictly_ordered_by_severity() {
        for pair in Tier::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should precede {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn unit_crossed_until_excludes_start_and_includes_target() {
        let crossed = Tier::Warned.crossed_until(Tier::Archived).collect::<Vec<_>>();
        assert_eq!(crossed, vec![Tier::ArchivePendingNotified, Tier::Archived]);
        assert_eq!(Tier::Archived.crossed_until(Tier::Warned).count(), 0);
        assert_eq!(Tier::Warned.crossed_until(Tier::Warned).count(), 0);
    }

    #[test]
    fn unit_tier_serializes_as_snake_case() {
        let raw = serde_json::to_string(&Tier::ArchivePendingNotified).expect("serialize");
        assert_eq!(raw, "\"archive_pending_notified\"");
        let parsed: Tier = serde_json::from_str("\"deletion_eligible\"").expect("parse");
        assert_eq!(parsed, Tier::DeletionEligible);
    }
}
