//! Paginates the channel directory into per-channel snapshots.

use std::{collections::HashSet, sync::Arc};

use futures_util::{stream, StreamExt};
use tidy_lifecycle::{ChannelSnapshot, LookupFailure, LookupKind};
use tracing::{debug, warn};

use crate::workspace_api::{ChannelMeta, WorkspaceApi, WorkspaceApiError};

/// One directory page: snapshots of the channels the caller is a member of,
/// plus the ids of listed channels it is not a member of.
#[derive(Debug, Default)]
pub(super) struct CollectedPage {
    pub(super) snapshots: Vec<ChannelSnapshot>,
    pub(super) non_member_ids: Vec<String>,
}

/// Lazily walks `conversations.list`, one page per [`SnapshotCollector::next_page`] call.
///
/// Each call re-queries the live directory; a collector is single-use.
pub(super) struct SnapshotCollector {
    api: Arc<dyn WorkspaceApi>,
    concurrency: usize,
    next_cursor: Option<String>,
    seen_cursors: HashSet<String>,
    finished: bool,
    exhausted: bool,
    pages_fetched: usize,
}

impl SnapshotCollector {
    pub(super) fn new(api: Arc<dyn WorkspaceApi>, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
            next_cursor: None,
            seen_cursors: HashSet::new(),
            finished: false,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    pub(super) fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// True once the directory reported no further cursor, i.e. every
    /// listed channel has been seen.
    pub(super) fn exhausted(&self) -> bool {
        self.exhausted
    }

    /// Returns the next page of snapshots, `Ok(None)` once the directory is
    /// exhausted, or the listing error that ended pagination.
    pub(super) async fn next_page(
        &mut self,
    ) -> Result<Option<CollectedPage>, WorkspaceApiError> {
        if self.finished {
            return Ok(None);
        }
        let page = match self.api.list_channels(self.next_cursor.as_deref()).await {
            Ok(page) => page,
            Err(error) => {
                self.finished = true;
                return Err(error);
            }
        };
        self.pages_fetched = self.pages_fetched.saturating_add(1);
        self.next_cursor = match page.next_cursor {
            Some(cursor) if self.seen_cursors.insert(cursor.clone()) => Some(cursor),
            Some(cursor) => {
                warn!(cursor = %cursor, "channel directory repeated a cursor; stopping pagination");
                self.finished = true;
                None
            }
            None => {
                self.finished = true;
                self.exhausted = true;
                None
            }
        };
        debug!(
            page = self.pages_fetched,
            channels = page.channels.len(),
            has_more = self.next_cursor.is_some(),
            "fetched channel directory page"
        );

        // Channels the caller has not joined answer history lookups with
        // `not_in_channel`; they are listed but never snapshotted.
        let (members, non_members): (Vec<_>, Vec<_>) =
            page.channels.into_iter().partition(|entry| entry.is_member);
        let non_member_ids = non_members
            .into_iter()
            .map(|entry| {
                debug!(channel_id = %entry.id, "skipping channel the caller is not a member of");
                entry.id
            })
            .collect();

        let api = self.api.as_ref();
        let snapshots = stream::iter(members)
            .map(|entry| snapshot_channel(api, entry))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;
        Ok(Some(CollectedPage {
            snapshots,
            non_member_ids,
        }))
    }
}

/// Merges a directory entry with its channel info and latest message.
///
/// Lookup failures never abort: the affected fields stay unset and the
/// failure travels with the snapshot.
pub(super) async fn snapshot_channel(api: &dyn WorkspaceApi, entry: ChannelMeta) -> ChannelSnapshot {
    let mut lookup_failures = Vec::new();

    let info = match api.channel_info(&entry.id).await {
        Ok(info) => Some(info),
        Err(error) => {
            warn!(channel_id = %entry.id, %error, "channel info lookup failed");
            lookup_failures.push(lookup_failure(LookupKind::ChannelInfo, &error));
            None
        }
    };
    let (name, creator_id, created_at, is_archived, is_general) = match info {
        Some(info) => (
            if info.name.trim().is_empty() {
                entry.name.clone()
            } else {
                info.name
            },
            info.creator.filter(|creator| !creator.trim().is_empty()),
            info.created,
            info.is_archived,
            info.is_general || entry.is_general,
        ),
        None => (
            entry.name.clone(),
            None,
            entry.created,
            entry.is_archived,
            entry.is_general,
        ),
    };

    // Archived channels are classified by archival age alone.
    let last_message_at = if is_archived {
        None
    } else {
        match api.last_message(&entry.id).await {
            Ok(Some(message)) => {
                let parsed = message.timestamp_unix();
                if parsed.is_none() {
                    lookup_failures.push(LookupFailure {
                        kind: LookupKind::LastMessage,
                        rate_limited: false,
                        reason: format!("unparseable message ts '{}'", message.ts),
                    });
                }
                parsed
            }
            Ok(None) => None,
            Err(error) => {
                warn!(channel_id = %entry.id, %error, "last message lookup failed");
                lookup_failures.push(lookup_failure(LookupKind::LastMessage, &error));
                None
            }
        }
    };

    ChannelSnapshot {
        channel_id: entry.id,
        name,
        creator_id,
        is_member: entry.is_member,
        is_general,
        created_at,
        is_archived,
        last_message_at,
        lookup_failures,
    }
}

fn lookup_failure(kind: LookupKind, error: &WorkspaceApiError) -> LookupFailure {
    LookupFailure {
        kind,
        rate_limited: error.is_rate_limited(),
        reason: error.to_string(),
    }
}
