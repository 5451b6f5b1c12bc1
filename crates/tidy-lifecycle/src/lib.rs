//! Channel inactivity lifecycle: tiers, thresholds, classification, and the
//! transition policy that decides which actions a sweep performs.
//!
//! Everything in this crate is synchronous and free of network I/O. The
//! Slack-facing collector, executor, and sweep loop live in
//! `tidy-slack-runtime` and drive these types.

pub mod action;
pub mod classifier;
pub mod policy;
pub mod snapshot;
pub mod tier;
pub mod tier_store;
pub mod transition_policy;

pub use action::{Action, ChannelNotice, CreatorNotice, HousekeepingEvent};
pub use classifier::InactivityClassifier;
pub use policy::{LifecyclePolicy, PolicyValidationError, LIFECYCLE_POLICY_VERSION};
pub use snapshot::{ChannelSnapshot, LookupFailure, LookupKind};
pub use tier::Tier;
pub use tier_store::{TierObservation, TierRecord, TierStore, TIER_STORE_SCHEMA_VERSION};
pub use transition_policy::{PolicyDecision, TierStep, TransitionPolicy};
