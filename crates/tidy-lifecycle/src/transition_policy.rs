//! Decides which actions fire when a channel moves between tiers.
//!
//! Actions are attached to tier boundaries, never to tiers themselves: a
//! boundary fires once, the sweep that first crosses it. Re-running a sweep
//! against an unchanged channel therefore produces an empty decision once the
//! previous run's tier has been recorded.

use serde::Serialize;

use crate::{Action, ChannelNotice, CreatorNotice, HousekeepingEvent, LifecyclePolicy, Tier};

/// Actions attached to one tier boundary, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierStep {
    pub tier: Tier,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDecision {
    pub channel_id: String,
    pub previous: Tier,
    pub target: Tier,
    pub steps: Vec<TierStep>,
}

impl PolicyDecision {
    /// Flattened action list in execution order.
    pub fn actions(&self) -> Vec<Action> {
        self.steps
            .iter()
            .flat_map(|step| step.actions.iter().copied())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn advances(&self) -> bool {
        self.target > self.previous
    }
}

#[derive(Debug, Clone)]
pub struct TransitionPolicy {
    final_notice_enabled: bool,
}

impl TransitionPolicy {
    pub fn new(policy: &LifecyclePolicy) -> Self {
        Self {
            final_notice_enabled: policy.final_notice_enabled(),
        }
    }

    /// Builds the decision for a channel moving from `previous_tier` to `new_tier`.
    ///
    /// A `new_tier` at or below `previous_tier` yields an empty decision.
    /// Boundaries without actions produce no step, so they can never confirm a
    /// tier on their own.
    pub fn decide(&self, channel_id: &str, new_tier: Tier, previous_tier: Tier) -> PolicyDecision {
        let steps = previous_tier
            .crossed_until(new_tier)
            .map(|tier| TierStep {
                tier,
                actions: self.actions_for_crossing(tier, previous_tier),
            })
            .filter(|step| !step.actions.is_empty())
            .collect();
        PolicyDecision {
            channel_id: channel_id.to_string(),
            previous: previous_tier,
            target: new_tier.max(previous_tier),
            steps,
        }
    }

    fn actions_for_crossing(&self, tier: Tier, previous_tier: Tier) -> Vec<Action> {
        match tier {
            Tier::Active => Vec::new(),
            Tier::Warned => vec![
                Action::NotifyCreator(CreatorNotice::Warning),
                Action::NotifyHousekeeping(HousekeepingEvent::Warned),
            ],
            Tier::ArchivePendingNotified if self.final_notice_enabled => vec![
                Action::NotifyCreator(CreatorNotice::FinalNotice),
                Action::NotifyHousekeeping(HousekeepingEvent::ArchivePending),
            ],
            Tier::ArchivePendingNotified => Vec::new(),
            Tier::Archived => vec![
                Action::ArchiveChannel,
                Action::NotifyChannel(ChannelNotice::Archived),
                Action::NotifyHousekeeping(HousekeepingEvent::Archived),
            ],
            Tier::DeletionEligible => removal_actions(),
            // Deletion-eligible and deleted share one removal; only emit it
            // here when the walk started past deletion-eligible.
            Tier::Deleted if previous_tier >= Tier::DeletionEligible => removal_actions(),
            Tier::Deleted => Vec::new(),
        }
    }
}

fn removal_actions() -> Vec<Action> {
    vec![
        Action::DeleteChannel,
        Action::NotifyHousekeeping(HousekeepingEvent::Removed),
    ]
}

#[cfg(test)]
mod tests {
    use super::TransitionPolicy;
    use crate::{
        Action, ChannelNotice, CreatorNotice, HousekeepingEvent, LifecyclePolicy, Tier,
    };

    fn engine() -> TransitionPolicy {
        TransitionPolicy::new(&LifecyclePolicy::default())
    }

    fn engine_with_final_notice() -> TransitionPolicy {
        let policy = LifecyclePolicy {
            final_notice_lead_secs: Some(3 * 86_400),
            ..LifecyclePolicy::default()
        };
        TransitionPolicy::new(&policy)
    }

    #[test]
    fn unit_decide_warns_on_first_crossing_into_warned() {
        let decision = engine().decide("C1", Tier::Warned, Tier::Active);
        assert_eq!(
            decision.actions(),
            vec![
                Action::NotifyCreator(CreatorNotice::Warning),
                Action::NotifyHousekeeping(HousekeepingEvent::Warned),
            ]
        );
        assert_eq!(decision.target, Tier::Warned);
        assert_eq!(decision.channel_id, "C1");
    }

    #[test]
    fn unit_decide_is_empty_when_tier_unchanged() {
        let decision = engine().decide("C1", Tier::Warned, Tier::Warned);
        assert!(decision.is_empty());
        assert!(decision.actions().is_empty());
        assert!(!decision.advances());
    }

    #[test]
    fn unit_decide_archives_before_announcing_archive() {
        let decision = engine().decide("C1", Tier::Archived, Tier::Warned);
        assert_eq!(
            decision.actions(),
            vec![
                Action::ArchiveChannel,
                Action::NotifyChannel(ChannelNotice::Archived),
                Action::NotifyHousekeeping(HousekeepingEvent::Archived),
            ]
        );
    }

    #[test]
    fn unit_decide_removes_deletion_eligible_channel() {
        let decision = engine().decide("C1", Tier::DeletionEligible, Tier::Archived);
        assert_eq!(
            decision.actions(),
            vec![
                Action::DeleteChannel,
                Action::NotifyHousekeeping(HousekeepingEvent::Removed),
            ]
        );
    }

    #[test]
    fn unit_decide_emits_removal_once_when_crossing_both_deletion_tiers() {
        let decision = engine().decide("C1", Tier::Deleted, Tier::Archived);
        let deletes = decision
            .actions()
            .into_iter()
            .filter(|action| *action == Action::DeleteChannel)
            .count();
        assert_eq!(deletes, 1);

        let resumed = engine().decide("C1", Tier::Deleted, Tier::DeletionEligible);
        assert_eq!(
            resumed.actions(),
            vec![
                Action::DeleteChannel,
                Action::NotifyHousekeeping(HousekeepingEvent::Removed),
            ]
        );
    }

    #[test]
    fn functional_decide_batches_every_crossed_boundary_in_order() {
        let decision = engine().decide("C1", Tier::DeletionEligible, Tier::Active);
        assert_eq!(
            decision.actions(),
            vec![
                Action::NotifyCreator(CreatorNotice::Warning),
                Action::NotifyHousekeeping(HousekeepingEvent::Warned),
                Action::ArchiveChannel,
                Action::NotifyChannel(ChannelNotice::Archived),
                Action::NotifyHousekeeping(HousekeepingEvent::Archived),
                Action::DeleteChannel,
                Action::NotifyHousekeeping(HousekeepingEvent::Removed),
            ]
        );
        let tiers = decision.steps.iter().map(|step| step.tier).collect::<Vec<_>>();
        assert_eq!(
            tiers,
            vec![Tier::Warned, Tier::Archived, Tier::DeletionEligible]
        );
    }

    #[test]
    fn unit_final_notice_actions_only_fire_when_enabled() {
        let disabled = engine().decide("C1", Tier::ArchivePendingNotified, Tier::Warned);
        assert!(disabled.is_empty());
        assert_eq!(disabled.target, Tier::ArchivePendingNotified);

        let enabled =
            engine_with_final_notice().decide("C1", Tier::ArchivePendingNotified, Tier::Warned);
        assert_eq!(
            enabled.actions(),
            vec![
                Action::NotifyCreator(CreatorNotice::FinalNotice),
                Action::NotifyHousekeeping(HousekeepingEvent::ArchivePending),
            ]
        );
    }

    #[test]
    fn functional_decide_never_regresses() {
        for engine in [engine(), engine_with_final_notice()] {
            for previous in Tier::ALL {
                for new_tier in Tier::ALL.into_iter().filter(|tier| *tier <= previous) {
                    let decision = engine.decide("C1", new_tier, previous);
                    assert!(
                        decision.actions().is_empty(),
                        "{new_tier} after {previous} should not act"
                    );
                    assert_eq!(decision.target, previous);
                }
            }
        }
    }

    #[test]
    fn functional_decide_is_idempotent_once_target_is_recorded() {
        for engine in [engine(), engine_with_final_notice()] {
            for previous in Tier::ALL {
                for new_tier in Tier::ALL {
                    let first = engine.decide("C1", new_tier, previous);
                    let second = engine.decide("C1", new_tier, first.target);
                    assert!(second.is_empty());
                }
            }
        }
    }

    #[test]
    fn functional_archive_always_precedes_archived_notice() {
        for previous in Tier::ALL {
            for new_tier in Tier::ALL {
                let actions = engine_with_final_notice()
                    .decide("C1", new_tier, previous)
                    .actions();
                let archive = actions
                    .iter()
                    .position(|action| *action == Action::ArchiveChannel);
                let notice = actions
                    .iter()
                    .position(|action| *action == Action::NotifyChannel(ChannelNotice::Archived));
                if let Some(notice) = notice {
                    let archive = archive.expect("archived notice without archive action");
                    assert!(archive < notice);
                }
            }
        }
    }
}
