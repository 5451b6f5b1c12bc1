//! Cross-sweep memory of each channel's last confirmed tier.
//!
//! The store is a single JSON document written atomically. A missing file is
//! an empty store; an unreadable or foreign-schema file is an error, since
//! starting fresh would re-fire every notification the previous sweeps sent.

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tidy_core::write_text_atomic;
use tracing::warn;

use crate::{Tier, LIFECYCLE_POLICY_VERSION};

pub const TIER_STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRecord {
    pub tier: Tier,
    #[serde(default)]
    pub name: Option<String>,
    pub first_seen_unix: u64,
    pub updated_unix: u64,
    /// Set when this system archived the channel; the deletion clock starts here.
    #[serde(default)]
    pub archived_at: Option<u64>,
    /// Last message timestamp observed while recording this tier.
    #[serde(default)]
    pub last_message_at: Option<u64>,
}

/// What a sweep learned about a channel, applied with [`TierStore::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierObservation {
    pub name: String,
    pub tier: Tier,
    pub archived_at: Option<u64>,
    pub last_message_at: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TierStoreState {
    schema_version: u32,
    #[serde(default)]
    policy_version: u32,
    #[serde(default)]
    last_sweep_unix: Option<u64>,
    #[serde(default)]
    channels: BTreeMap<String, TierRecord>,
}

impl Default for TierStoreState {
    fn default() -> Self {
        Self {
            schema_version: TIER_STORE_SCHEMA_VERSION,
            policy_version: LIFECYCLE_POLICY_VERSION,
            last_sweep_unix: None,
            channels: BTreeMap::new(),
        }
    }
}

pub struct TierStore {
    path: Option<PathBuf>,
    state: TierStoreState,
    dirty: bool,
}

impl TierStore {
    /// Loads the store at `path`, starting empty when the file does not exist.
    pub fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read tier store {}", path.display()))?;
            serde_json::from_str::<TierStoreState>(&raw)
                .with_context(|| format!("failed to parse tier store {}", path.display()))?
        } else {
            TierStoreState::default()
        };

        if state.schema_version != TIER_STORE_SCHEMA_VERSION {
            bail!(
                "unsupported tier store schema: expected {}, found {}",
                TIER_STORE_SCHEMA_VERSION,
                state.schema_version
            );
        }
        if state.policy_version != LIFECYCLE_POLICY_VERSION {
            warn!(
                path = %path.display(),
                recorded = state.policy_version,
                current = LIFECYCLE_POLICY_VERSION,
                "tier store was written under a different lifecycle policy version"
            );
        }

        Ok(Self {
            path: Some(path),
            state,
            dirty: false,
        })
    }

    /// In-memory store; nothing survives the process, so every sweep starts
    /// from the observed channel state and re-notifies past each threshold.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            state: TierStoreState::default(),
            dirty: false,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    pub fn get(&self, channel_id: &str) -> Option<&TierRecord> {
        self.state.channels.get(channel_id)
    }

    pub fn tier_of(&self, channel_id: &str) -> Option<Tier> {
        self.get(channel_id).map(|record| record.tier)
    }

    pub fn len(&self) -> usize {
        self.state.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.channels.is_empty()
    }

    pub fn channel_ids(&self) -> impl Iterator<Item = &str> {
        self.state.channels.keys().map(String::as_str)
    }

    pub fn last_sweep_unix(&self) -> Option<u64> {
        self.state.last_sweep_unix
    }

    /// Applies an observation; a `Deleted` tier removes the record entirely.
    pub fn record(&mut self, channel_id: &str, observation: TierObservation, now_unix: u64) {
        if observation.tier == Tier::Deleted {
            if self.state.channels.remove(channel_id).is_some() {
                self.dirty = true;
            }
            return;
        }

        let record = self
            .state
            .channels
            .entry(channel_id.to_string())
            .or_insert_with(|| TierRecord {
                tier: observation.tier,
                name: None,
                first_seen_unix: now_unix,
                updated_unix: now_unix,
                archived_at: None,
                last_message_at: None,
            });
        record.tier = observation.tier;
        record.name = Some(observation.name);
        record.updated_unix = now_unix;
        if observation.tier < Tier::Archived {
            record.archived_at = None;
        } else if observation.archived_at.is_some() {
            record.archived_at = observation.archived_at;
        }
        if observation.last_message_at.is_some() {
            record.last_message_at = observation.last_message_at;
        }
        self.dirty = true;
    }

    pub fn remove(&mut self, channel_id: &str) -> Option<TierRecord> {
        let removed = self.state.channels.remove(channel_id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn mark_sweep(&mut self, now_unix: u64) {
        self.state.last_sweep_unix = Some(now_unix);
        self.dirty = true;
    }

    /// Writes pending changes; a no-op for ephemeral stores and clean state.
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            self.dirty = false;
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        self.state.policy_version = LIFECYCLE_POLICY_VERSION;
        let mut payload = serde_json::to_string_pretty(&self.state)
            .context("failed to serialize tier store")?;
        payload.push('\n');
        write_text_atomic(path, &payload)
            .with_context(|| format!("failed to write tier store {}", path.display()))?;
        self.dirty = false;
        Ok(())
    }
}
