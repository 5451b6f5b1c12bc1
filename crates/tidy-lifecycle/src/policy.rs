//! Versioned lifecycle thresholds.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tidy_core::SECONDS_PER_DAY;

/// Version stamped into sweep summaries and the tier store so operators can
/// tell which threshold semantics produced a recorded tier.
pub const LIFECYCLE_POLICY_VERSION: u32 = 1;

const DEFAULT_WARN_AFTER_SECS: u64 = 21 * SECONDS_PER_DAY;
const DEFAULT_ARCHIVE_AFTER_SECS: u64 = 30 * SECONDS_PER_DAY;
const DEFAULT_DELETE_AFTER_SECS: u64 = 90 * SECONDS_PER_DAY;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyValidationError {
    #[error("warn threshold must be greater than zero")]
    ZeroWarnThreshold,
    #[error("archive threshold ({archive_after_secs}s) must exceed warn threshold ({warn_after_secs}s)")]
    ArchiveNotAfterWarn {
        warn_after_secs: u64,
        archive_after_secs: u64,
    },
    #[error("delete threshold ({delete_after_secs}s) must exceed archive threshold ({archive_after_secs}s)")]
    DeleteNotAfterArchive {
        archive_after_secs: u64,
        delete_after_secs: u64,
    },
    #[error("final notice lead ({lead_secs}s) must be non-zero and leave the final notice after the warning")]
    FinalNoticeLeadOutOfRange { lead_secs: u64 },
}

/// Inactivity thresholds, in seconds.
///
/// `warn_after_secs` and `archive_after_secs` are measured from the last
/// message; `delete_after_secs` is measured from archival (or creation when
/// the archival time is unknown).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    pub version: u32,
    pub warn_after_secs: u64,
    pub archive_after_secs: u64,
    pub delete_after_secs: u64,
    #[serde(default)]
    pub final_notice_lead_secs: Option<u64>,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            version: LIFECYCLE_POLICY_VERSION,
            warn_after_secs: DEFAULT_WARN_AFTER_SECS,
            archive_after_secs: DEFAULT_ARCHIVE_AFTER_SECS,
            delete_after_secs: DEFAULT_DELETE_AFTER_SECS,
            final_notice_lead_secs: None,
        }
    }
}

impl LifecyclePolicy {
    /// Builds and validates a policy from raw thresholds.
    pub fn new(
        warn_after_secs: u64,
        archive_after_secs: u64,
        delete_after_secs: u64,
        final_notice_lead_secs: Option<u64>,
    ) -> Result<Self, PolicyValidationError> {
        let policy = Self {
            version: LIFECYCLE_POLICY_VERSION,
            warn_after_secs,
            archive_after_secs,
            delete_after_secs,
            final_notice_lead_secs,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.warn_after_secs == 0 {
            return Err(PolicyValidationError::ZeroWarnThreshold);
        }
        if self.archive_after_secs <= self.warn_after_secs {
            return Err(PolicyValidationError::ArchiveNotAfterWarn {
                warn_after_secs: self.warn_after_secs,
                archive_after_secs: self.archive_after_secs,
            });
        }
        if self.delete_after_secs <= self.archive_after_secs {
            return Err(PolicyValidationError::DeleteNotAfterArchive {
                archive_after_secs: self.archive_after_secs,
                delete_after_secs: self.delete_after_secs,
            });
        }
        if let Some(lead_secs) = self.final_notice_lead_secs {
            if lead_secs == 0 || self.archive_after_secs - self.warn_after_secs <= lead_secs {
                return Err(PolicyValidationError::FinalNoticeLeadOutOfRange { lead_secs });
            }
        }
        Ok(())
    }

    /// Inactivity at which the final pre-archive notice becomes due, when enabled.
    pub fn final_notice_after_secs(&self) -> Option<u64> {
        self.final_notice_lead_secs
            .map(|lead_secs| self.archive_after_secs.saturating_sub(lead_secs))
    }

    pub fn final_notice_enabled(&self) -> bool {
        self.final_notice_lead_secs.is_some()
    }
}
