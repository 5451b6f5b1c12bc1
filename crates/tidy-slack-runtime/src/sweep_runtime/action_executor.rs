//! Executes a channel's policy decision against the workspace.
//!
//! Actions run in decision order. A failed mandatory action (archive, delete)
//! suppresses the rest of its tier step and every later step, but never the
//! steps already executed. The confirmed tier is the highest tier whose
//! mandatory actions all succeeded.

use std::sync::Arc;

use tidy_lifecycle::{
    Action, ChannelNotice, ChannelSnapshot, LifecyclePolicy, PolicyDecision, Tier,
};
use tracing::{info, warn};

use super::notice_render_helpers::{
    render_channel_notice, render_creator_notice, render_housekeeping_notice, NoticeContext,
};
use super::FailureKind;
use crate::workspace_api::{WorkspaceApi, WorkspaceApiError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ActionStatus {
    Succeeded,
    /// Dry run: the action would have been attempted.
    Planned,
    Failed { kind: FailureKind, reason: String },
    Skipped { reason: String },
}

impl ActionStatus {
    pub(super) fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Planned => "planned",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }

    /// Succeeded, or would have been attempted in a dry run.
    pub(super) fn is_effective(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Planned)
    }

    pub(super) fn reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } | Self::Skipped { reason } => Some(reason.as_str()),
            Self::Succeeded | Self::Planned => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ActionOutcome {
    pub(super) tier: Tier,
    pub(super) action: Action,
    pub(super) status: ActionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ExecutionReport {
    pub(super) confirmed_tier: Tier,
    /// Sweep time, when this execution archived the channel.
    pub(super) archived_at: Option<u64>,
    pub(super) outcomes: Vec<ActionOutcome>,
}

impl ExecutionReport {
    pub(super) fn unchanged(tier: Tier) -> Self {
        Self {
            confirmed_tier: tier,
            archived_at: None,
            outcomes: Vec::new(),
        }
    }

    pub(super) fn effective(&self, action: Action) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| outcome.action == action && outcome.status.is_effective())
    }
}

pub(super) struct ActionExecutor {
    api: Arc<dyn WorkspaceApi>,
    policy: LifecyclePolicy,
    housekeeping_channel: String,
    dry_run: bool,
}

impl ActionExecutor {
    pub(super) fn new(
        api: Arc<dyn WorkspaceApi>,
        policy: LifecyclePolicy,
        housekeeping_channel: String,
        dry_run: bool,
    ) -> Self {
        Self {
            api,
            policy,
            housekeeping_channel,
            dry_run,
        }
    }

    pub(super) async fn execute(
        &self,
        snapshot: &ChannelSnapshot,
        decision: &PolicyDecision,
        context: NoticeContext,
        now_unix: u64,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::unchanged(decision.previous);
        let mut blocked_by: Option<&'static str> = None;

        for step in &decision.steps {
            if let Some(prerequisite) = blocked_by {
                for action in &step.actions {
                    report.outcomes.push(ActionOutcome {
                        tier: step.tier,
                        action: *action,
                        status: ActionStatus::Skipped {
                            reason: format!("prerequisite {prerequisite} failed"),
                        },
                    });
                }
                continue;
            }

            let mut step_confirms = step.tier;
            for action in &step.actions {
                let status = match blocked_by {
                    Some(prerequisite) => ActionStatus::Skipped {
                        reason: format!("prerequisite {prerequisite} failed"),
                    },
                    None => self.perform(*action, snapshot, context).await,
                };
                if status.is_effective() {
                    if *action == Action::ArchiveChannel {
                        report.archived_at = Some(now_unix);
                    }
                    if let Some(tier) = action.confirms_tier() {
                        step_confirms = step_confirms.max(tier);
                    }
                } else if action.is_mandatory() && blocked_by.is_none() {
                    blocked_by = Some(action.label());
                }
                report.outcomes.push(ActionOutcome {
                    tier: step.tier,
                    action: *action,
                    status,
                });
            }

            if blocked_by.is_none() {
                report.confirmed_tier = report.confirmed_tier.max(step_confirms);
            }
        }
        report
    }

    async fn perform(
        &self,
        action: Action,
        snapshot: &ChannelSnapshot,
        context: NoticeContext,
    ) -> ActionStatus {
        let channel_id = snapshot.channel_id.as_str();
        let request = match action {
            Action::NotifyCreator(notice) => {
                let Some(creator_id) = snapshot.creator_id.as_deref() else {
                    warn!(channel_id, action = %action, "channel creator unknown; cannot notify");
                    return ActionStatus::Failed {
                        kind: FailureKind::Lookup,
                        reason: "channel creator unknown (channel info lookup failed)".to_string(),
                    };
                };
                PendingCall::Post {
                    target: creator_id.to_string(),
                    text: render_creator_notice(notice, &snapshot.name, &self.policy, context),
                }
            }
            Action::NotifyHousekeeping(event) => PendingCall::Post {
                target: self.housekeeping_channel.clone(),
                text: render_housekeeping_notice(event, &snapshot.name, context),
            },
            Action::NotifyChannel(notice) => PendingCall::Post {
                target: channel_id.to_string(),
                text: render_channel_notice(notice, &snapshot.name),
            },
            Action::ArchiveChannel => PendingCall::Archive,
            Action::DeleteChannel => PendingCall::Delete,
        };

        if self.dry_run {
            info!(channel_id, action = %action, "dry run: action planned");
            return ActionStatus::Planned;
        }

        let result = match &request {
            PendingCall::Post { target, text } => self.api.post_message(target, text).await,
            PendingCall::Archive => self.api.archive_channel(channel_id).await,
            PendingCall::Delete => self.api.delete_channel(channel_id).await,
        };
        match result {
            Ok(()) => {
                info!(channel_id, action = %action, "action succeeded");
                ActionStatus::Succeeded
            }
            Err(error) if rejects_archived_notice(action, &error) => {
                info!(channel_id, action = %action, %error, "channel closed to posts after archive");
                ActionStatus::Skipped {
                    reason: error.to_string(),
                }
            }
            Err(error) => {
                warn!(channel_id, action = %action, %error, "action failed");
                ActionStatus::Failed {
                    kind: failure_kind(&error),
                    reason: error.to_string(),
                }
            }
        }
    }
}

enum PendingCall {
    Post { target: String, text: String },
    Archive,
    Delete,
}

/// Some workspaces refuse posts to a channel once it is archived; the
/// archived notice then has nowhere to go and is not a failure.
fn rejects_archived_notice(action: Action, error: &WorkspaceApiError) -> bool {
    action == Action::NotifyChannel(ChannelNotice::Archived)
        && matches!(error, WorkspaceApiError::Rejected { code, .. } if code == "is_archived")
}

fn failure_kind(error: &WorkspaceApiError) -> FailureKind {
    if error.is_rate_limited() {
        FailureKind::RateLimited
    } else {
        FailureKind::Action
    }
}
