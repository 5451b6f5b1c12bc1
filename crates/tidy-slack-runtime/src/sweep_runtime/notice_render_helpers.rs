//! Text of the notices posted to creators, channels, and the housekeeping channel.

use tidy_core::{render_days_hours, render_threshold};
use tidy_lifecycle::{ChannelNotice, CreatorNotice, HousekeepingEvent, LifecyclePolicy};

/// Facts a notice may mention, computed once per channel per sweep.
#[derive(Debug, Clone, Copy)]
pub(super) struct NoticeContext {
    pub(super) seconds_until_archive: u64,
}

pub(super) fn render_creator_notice(
    notice: CreatorNotice,
    channel_name: &str,
    policy: &LifecyclePolicy,
    context: NoticeContext,
) -> String {
    match notice {
        CreatorNotice::Warning => format!(
            "The channel #{channel_name} has been inactive for more than {}. It will be autoarchived soon. If you wish to keep the channel active, please send a message.",
            render_threshold(policy.warn_after_secs)
        ),
        CreatorNotice::FinalNotice => format!(
            "Final notice: the channel #{channel_name} will be autoarchived in {}. If you wish to keep the channel active, please send a message.",
            render_days_hours(context.seconds_until_archive)
        ),
    }
}

pub(super) fn render_channel_notice(notice: ChannelNotice, channel_name: &str) -> String {
    match notice {
        ChannelNotice::Archived => format!(
            "The channel #{channel_name} has been archived. If you need it reopened, please contact an admin."
        ),
    }
}

pub(super) fn render_housekeeping_notice(
    event: HousekeepingEvent,
    channel_name: &str,
    context: NoticeContext,
) -> String {
    let message = match event {
        HousekeepingEvent::Warned => format!(
            "Channel #{channel_name} is inactive. It will be autoarchived in {}.",
            render_days_hours(context.seconds_until_archive)
        ),
        HousekeepingEvent::ArchivePending => format!(
            "Channel #{channel_name} is still inactive and will be autoarchived in {}.",
            render_days_hours(context.seconds_until_archive)
        ),
        HousekeepingEvent::Archived => format!("Channel #{channel_name} has been archived."),
        HousekeepingEvent::Removed => format!("Channel #{channel_name} has been removed."),
    };
    format!("Autoarchive Notice: {message}")
}
