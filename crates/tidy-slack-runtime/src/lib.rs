//! Slack-backed channel housekeeping runtime.
//!
//! Collects channel snapshots through the Slack Web API, runs them through the
//! lifecycle policy from `tidy-lifecycle`, executes the resulting actions, and
//! records confirmed tiers so repeated sweeps converge without repeating work.

pub mod slack_helpers;
pub mod sweep_runtime;
pub mod workspace_api;

pub use sweep_runtime::{
    run_channel_sweep, FailureKind, SlackApiClient, SweepFailure, SweepRuntime,
    SweepRuntimeConfig, SweepSummary,
};
pub use workspace_api::{ChannelMeta, ChannelPage, LastMessage, WorkspaceApi, WorkspaceApiError};
