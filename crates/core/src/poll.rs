//! Poll results and status classification.
//!
//! The poll loop only cares about two statuses: Azure DevOps answers an
//! unusable PAT with `203 Non-Authoritative Information` (a sign-in page
//! instead of JSON) and an unknown organization with `404`. Everything else
//! is treated as a successful pull.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PollError;

/// Status Azure DevOps returns when the credential is rejected.
pub const STATUS_NON_AUTHORITATIVE: u16 = 203;

pub const STATUS_NOT_FOUND: u16 = 404;

/// Outcome of classifying a single response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    Success,
    CredentialMisconfigured,
    UrlMisconfigured,
}

impl PollVerdict {
    pub fn is_fatal(self) -> bool {
        !matches!(self, PollVerdict::Success)
    }

    /// The error the loop should stop with, or `None` to keep going.
    pub fn into_error(self) -> Option<PollError> {
        match self {
            PollVerdict::Success => None,
            PollVerdict::CredentialMisconfigured => Some(PollError::CredentialMisconfigured),
            PollVerdict::UrlMisconfigured => Some(PollError::UrlMisconfigured),
        }
    }
}

/// Map an HTTP status code onto a [`PollVerdict`].
pub fn classify(status: u16) -> PollVerdict {
    match status {
        STATUS_NON_AUTHORITATIVE => PollVerdict::CredentialMisconfigured,
        STATUS_NOT_FOUND => PollVerdict::UrlMisconfigured,
        _ => PollVerdict::Success,
    }
}

/// Transient record of one poll iteration. Never persisted.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Correlation id shared by every log line of the iteration.
    pub execution_id: Uuid,
    pub status_code: u16,
    /// Response size in bytes, if known.
    pub content_length: Option<u64>,
    /// Logged with successful pulls.
    pub polled_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl PollOutcome {
    pub fn verdict(&self) -> PollVerdict {
        classify(self.status_code)
    }
}
