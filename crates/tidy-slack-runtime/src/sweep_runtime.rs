//! Channel housekeeping sweep: collect, classify, decide, execute, persist.

use std::{collections::HashSet, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use serde_json::json;
use tidy_core::current_unix_timestamp_ms;
use tidy_lifecycle::{
    Action, ChannelSnapshot, InactivityClassifier, LifecyclePolicy, PolicyDecision, Tier,
    TierObservation, TierRecord, TierStore, TransitionPolicy,
};
use tracing::{debug, info, warn};

use crate::slack_helpers::normalize_channel_ref;
use crate::workspace_api::WorkspaceApi;

mod action_executor;
mod action_log;
mod notice_render_helpers;
mod slack_api_client;
mod snapshot_collector;


use action_executor::{ActionExecutor, ActionStatus, ExecutionReport};
use action_log::JsonlActionLog;
use notice_render_helpers::NoticeContext;
pub use slack_api_client::SlackApiClient;
use snapshot_collector::SnapshotCollector;

const TIER_STORE_FILE: &str = "tiers.json";
const ACTION_LOG_FILE: &str = "actions.jsonl";

/// Runtime configuration for one sweep invocation.
#[derive(Debug, Clone)]
pub struct SweepRuntimeConfig {
    pub policy: LifecyclePolicy,
    pub housekeeping_channel: String,
    /// Channel ids or names (with or without `#`) that are never acted on.
    pub exempt_channels: Vec<String>,
    pub concurrency: usize,
    pub dry_run: bool,
    /// Directory holding the tier store and action log; `None` keeps tiers in memory.
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    #[serde(rename = "lookup_failure")]
    Lookup,
    #[serde(rename = "action_failure")]
    Action,
    #[serde(rename = "rate_limited")]
    RateLimited,
}

/// One channel-local failure, with enough context to retry or investigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub channel_id: String,
    pub channel_name: String,
    pub action: String,
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub now_unix: u64,
    pub policy_version: u32,
    pub dry_run: bool,
    pub pages: usize,
    pub processed: usize,
    pub exempt: usize,
    /// Listed channels the caller is not a member of; never acted on.
    pub non_member: usize,
    pub warned: usize,
    pub final_notices: usize,
    pub archived: usize,
    pub deleted: usize,
    pub notifications_sent: usize,
    pub skipped_actions: usize,
    /// Records dropped because their channel is no longer listed.
    pub forgotten: usize,
    pub failures: Vec<SweepFailure>,
    /// Set when the directory listing failed and the sweep ended early.
    pub listing_error: Option<String>,
}

impl SweepSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || self.listing_error.is_some()
    }
}

/// Runs a single sweep with a freshly loaded tier store.
pub async fn run_channel_sweep(
    config: SweepRuntimeConfig,
    api: Arc<dyn WorkspaceApi>,
    now_unix: u64,
) -> Result<SweepSummary> {
    let mut runtime = SweepRuntime::new(config, api)?;
    runtime.run_sweep(now_unix).await
}

pub struct SweepRuntime {
    config: SweepRuntimeConfig,
    api: Arc<dyn WorkspaceApi>,
    classifier: InactivityClassifier,
    transition_policy: TransitionPolicy,
    executor: ActionExecutor,
    store: TierStore,
    action_log: Option<JsonlActionLog>,
    exempt_refs: HashSet<String>,
}

struct ChannelWork {
    snapshot: ChannelSnapshot,
    record: Option<TierRecord>,
    exempt: bool,
}

struct ChannelOutcome {
    snapshot: ChannelSnapshot,
    exempt: bool,
    classified: Tier,
    decision: PolicyDecision,
    report: ExecutionReport,
}

impl SweepRuntime {
    pub fn new(config: SweepRuntimeConfig, api: Arc<dyn WorkspaceApi>) -> Result<Self> {
        config
            .policy
            .validate()
            .context("invalid lifecycle policy")?;

        let (store, action_log) = match config.state_dir.as_ref() {
            Some(state_dir) => {
                std::fs::create_dir_all(state_dir)
                    .with_context(|| format!("failed to create {}", state_dir.display()))?;
                (
                    TierStore::load(state_dir.join(TIER_STORE_FILE))?,
                    Some(JsonlActionLog::open(state_dir.join(ACTION_LOG_FILE))?),
                )
            }
            None => (TierStore::ephemeral(), None),
        };

        let mut exempt_refs = config
            .exempt_channels
            .iter()
            .map(|channel| normalize_channel_ref(channel))
            .filter(|channel| !channel.is_empty())
            .collect::<HashSet<_>>();
        exempt_refs.insert(normalize_channel_ref(&config.housekeeping_channel));

        Ok(Self {
            classifier: InactivityClassifier::new(config.policy.clone()),
            transition_policy: TransitionPolicy::new(&config.policy),
            executor: ActionExecutor::new(
                api.clone(),
                config.policy.clone(),
                config.housekeeping_channel.clone(),
                config.dry_run,
            ),
            api,
            store,
            action_log,
            exempt_refs,
            config,
        })
    }

    pub fn tier_store(&self) -> &TierStore {
        &self.store
    }

    /// Performs one full pass over the channel directory.
    ///
    /// Channel-local failures are reported in the summary; only tier store
    /// persistence errors abort the sweep. The store is saved after every page.
    pub async fn run_sweep(&mut self, now_unix: u64) -> Result<SweepSummary> {
        let mut summary = SweepSummary {
            now_unix,
            policy_version: self.config.policy.version,
            dry_run: self.config.dry_run,
            ..SweepSummary::default()
        };
        let mut collector = SnapshotCollector::new(self.api.clone(), self.config.concurrency);
        let mut listed_ids = HashSet::new();

        loop {
            let page = match collector.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(error) => {
                    warn!(%error, "channel directory listing failed; ending sweep early");
                    summary.listing_error = Some(error.to_string());
                    break;
                }
            };
            summary.non_member += page.non_member_ids.len();
            listed_ids.extend(page.non_member_ids);
            listed_ids.extend(
                page.snapshots
                    .iter()
                    .map(|snapshot| snapshot.channel_id.clone()),
            );
            self.process_page(page.snapshots, now_unix, &mut summary).await?;
        }
        summary.pages = collector.pages_fetched();

        if collector.exhausted() && !self.config.dry_run {
            summary.forgotten = self.forget_unlisted(&listed_ids);
        }
        if !self.config.dry_run {
            self.store.mark_sweep(now_unix);
            self.store.save()?;
        }
        info!(
            processed = summary.processed,
            warned = summary.warned,
            archived = summary.archived,
            deleted = summary.deleted,
            non_member = summary.non_member,
            forgotten = summary.forgotten,
            failures = summary.failures.len(),
            dry_run = summary.dry_run,
            "channel sweep finished"
        );
        Ok(summary)
    }

    async fn process_page(
        &mut self,
        page: Vec<ChannelSnapshot>,
        now_unix: u64,
        summary: &mut SweepSummary,
    ) -> Result<()> {
        let work = page
            .into_iter()
            .map(|snapshot| self.prepare(snapshot))
            .collect::<Vec<_>>();

        let classifier = &self.classifier;
        let transition_policy = &self.transition_policy;
        let executor = &self.executor;
        let outcomes = stream::iter(work)
            .map(|work| process_channel(classifier, transition_policy, executor, work, now_unix))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        for outcome in outcomes {
            self.apply_outcome(outcome, now_unix, summary);
        }
        if !self.config.dry_run {
            self.store.save()?;
        }
        Ok(())
    }

    /// Drops records of channels a complete listing no longer shows.
    fn forget_unlisted(&mut self, listed_ids: &HashSet<String>) -> usize {
        let unlisted = self
            .store
            .channel_ids()
            .filter(|channel_id| !listed_ids.contains(*channel_id))
            .map(str::to_string)
            .collect::<Vec<_>>();
        for channel_id in &unlisted {
            debug!(channel_id = %channel_id, "forgetting tier of unlisted channel");
            self.store.remove(channel_id);
        }
        unlisted.len()
    }

    fn prepare(&self, snapshot: ChannelSnapshot) -> ChannelWork {
        ChannelWork {
            exempt: self.is_exempt(&snapshot),
            record: self.store.get(&snapshot.channel_id).cloned(),
            snapshot,
        }
    }

    fn is_exempt(&self, snapshot: &ChannelSnapshot) -> bool {
        snapshot.is_general
            || self
                .exempt_refs
                .contains(&normalize_channel_ref(&snapshot.channel_id))
            || self.exempt_refs.contains(&normalize_channel_ref(&snapshot.name))
    }

    fn apply_outcome(&mut self, outcome: ChannelOutcome, now_unix: u64, summary: &mut SweepSummary) {
        let ChannelOutcome {
            snapshot,
            exempt,
            classified,
            decision,
            report,
        } = outcome;

        if exempt {
            debug!(channel_id = %snapshot.channel_id, "channel exempt from housekeeping");
            summary.exempt += 1;
            return;
        }
        summary.processed += 1;

        for failure in &snapshot.lookup_failures {
            summary.failures.push(SweepFailure {
                channel_id: snapshot.channel_id.clone(),
                channel_name: snapshot.name.clone(),
                action: format!("lookup:{}", failure.kind.as_str()),
                kind: if failure.rate_limited {
                    FailureKind::RateLimited
                } else {
                    FailureKind::Lookup
                },
                reason: failure.reason.clone(),
            });
        }

        for outcome in &report.outcomes {
            self.log_action(&snapshot, outcome, now_unix);
            match &outcome.status {
                ActionStatus::Failed { kind, reason } => summary.failures.push(SweepFailure {
                    channel_id: snapshot.channel_id.clone(),
                    channel_name: snapshot.name.clone(),
                    action: outcome.action.to_string(),
                    kind: *kind,
                    reason: reason.clone(),
                }),
                ActionStatus::Skipped { .. } => summary.skipped_actions += 1,
                ActionStatus::Succeeded | ActionStatus::Planned => {
                    if outcome.action.is_notification() {
                        summary.notifications_sent += 1;
                    }
                }
            }
        }

        let previous = decision.previous;
        let confirmed = report.confirmed_tier;
        if previous < Tier::Warned && confirmed >= Tier::Warned {
            summary.warned += 1;
        }
        if self.config.policy.final_notice_enabled()
            && previous < Tier::ArchivePendingNotified
            && confirmed >= Tier::ArchivePendingNotified
        {
            summary.final_notices += 1;
        }
        if report.effective(Action::ArchiveChannel) {
            summary.archived += 1;
        }
        if report.effective(Action::DeleteChannel) {
            summary.deleted += 1;
        }
        if confirmed < classified {
            info!(
                channel_id = %snapshot.channel_id,
                classified = %classified,
                confirmed = %confirmed,
                "tier held back by failed action; will retry next sweep"
            );
        }

        if self.config.dry_run {
            return;
        }
        self.store.record(
            &snapshot.channel_id,
            TierObservation {
                name: snapshot.name,
                tier: confirmed,
                archived_at: report.archived_at,
                last_message_at: snapshot.last_message_at,
            },
            now_unix,
        );
    }

    fn log_action(
        &self,
        snapshot: &ChannelSnapshot,
        outcome: &action_executor::ActionOutcome,
        now_unix: u64,
    ) {
        let Some(action_log) = self.action_log.as_ref() else {
            return;
        };
        let entry = json!({
            "timestamp_unix_ms": current_unix_timestamp_ms(),
            "sweep_now_unix": now_unix,
            "channel_id": snapshot.channel_id,
            "channel_name": snapshot.name,
            "tier": outcome.tier,
            "action": outcome.action,
            "status": outcome.status.as_str(),
            "reason": outcome.status.reason(),
            "dry_run": self.config.dry_run,
        });
        if let Err(error) = action_log.append(&entry) {
            warn!(%error, "failed to append action log entry");
        }
    }
}

async fn process_channel(
    classifier: &InactivityClassifier,
    transition_policy: &TransitionPolicy,
    executor: &ActionExecutor,
    work: ChannelWork,
    now_unix: u64,
) -> ChannelOutcome {
    let ChannelWork {
        snapshot,
        record,
        exempt,
    } = work;
    let archived_at = record.as_ref().and_then(|record| record.archived_at);
    let classified = classifier.classify_with_archival(&snapshot, archived_at, now_unix);
    let baseline = baseline_tier(record.as_ref(), &snapshot, classified);
    let decision = if exempt {
        transition_policy.decide(&snapshot.channel_id, baseline, baseline)
    } else {
        transition_policy.decide(&snapshot.channel_id, classified, baseline)
    };
    debug!(
        channel_id = %snapshot.channel_id,
        baseline = %baseline,
        classified = %classified,
        actions = decision.actions().len(),
        "channel classified"
    );

    let report = if decision.is_empty() {
        ExecutionReport::unchanged(baseline)
    } else {
        let context = NoticeContext {
            seconds_until_archive: classifier.time_until_archive(&snapshot, now_unix),
        };
        executor.execute(&snapshot, &decision, context, now_unix).await
    };

    ChannelOutcome {
        snapshot,
        exempt,
        classified,
        decision,
        report,
    }
}

/// The tier a channel is considered to be in before this sweep acts.
///
/// Reconciles the recorded tier with what the snapshot shows: archival done
/// outside this system, unarchival by a human, and new activity in a warned
/// channel that now classifies as active. None of these reconciliations emit
/// actions by themselves.
fn baseline_tier(
    record: Option<&TierRecord>,
    snapshot: &ChannelSnapshot,
    classified: Tier,
) -> Tier {
    let Some(record) = record else {
        return if snapshot.is_archived {
            Tier::Archived
        } else {
            Tier::Active
        };
    };
    if snapshot.is_archived {
        return record.tier.max(Tier::Archived);
    }
    if record.tier.is_archived_branch() {
        return Tier::Active;
    }
    let activity_resumed = matches!(
        (snapshot.last_message_at, record.last_message_at),
        (Some(observed), Some(recorded)) if observed > recorded
    );
    if record.tier > Tier::Active && classified == Tier::Active && activity_resumed {
        return Tier::Active;
    }
    record.tier
}
