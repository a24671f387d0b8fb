//! Governor contract shared by all trackers
//!
//! Every regime is driven through the same four calls: ask, record,
//! inspect, and (admin only) reset.

use serde::{Deserialize, Serialize};
use std::fmt;
use tollgate_core::Result;

/// How loudly a notice should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, e.g. 80% of quota used
    Info,
    /// Something needs attention soon
    Warning,
    /// Close to a hard cutoff
    Critical,
    /// The request must not be made
    Blocked,
}

impl Severity {
    /// Marker shown in front of the message
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Info => "💡",
            Self::Warning => "⚠️",
            Self::Critical => "🚨",
            Self::Blocked => "❌",
        }
    }
}

/// Human-readable advisory attached to a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub severity: Severity,
    /// Message text
    pub message: String,
}

impl Notice {
    /// Create a notice
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.severity.icon(), self.message)
    }
}

/// Go/no-go answer plus the state it was computed from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision<S> {
    /// Whether the external call may proceed
    pub allowed: bool,
    /// Warning or block reason, if any
    pub notice: Option<Notice>,
    /// Tracker state at decision time
    pub snapshot: S,
}

impl<S> Decision<S> {
    /// Allow, optionally with an advisory
    #[must_use]
    pub fn allow(notice: Option<Notice>, snapshot: S) -> Self {
        Self {
            allowed: true,
            notice,
            snapshot,
        }
    }

    /// Block with a reason
    #[must_use]
    pub fn block(message: impl Into<String>, snapshot: S) -> Self {
        Self {
            allowed: false,
            notice: Some(Notice::new(Severity::Blocked, message)),
            snapshot,
        }
    }
}

/// The four operations an external caller uses, whatever the regime.
///
/// Call [`Governor::check_allowed`] before the external request and
/// [`Governor::record`] after it. Store failures never surface here;
/// the worst outcome is `allowed == false`.
pub trait Governor {
    /// What the caller reports after an external call
    type Outcome;
    /// Read-only view of the tracker
    type Stats;

    /// Ask whether the next external call may proceed
    fn check_allowed(&self) -> Decision<Self::Stats>;

    /// Report the outcome of an external call
    fn record(&self, outcome: Self::Outcome);

    /// Current accounting state
    fn stats(&self) -> Self::Stats;

    /// Admin only: wipe the accounting state
    fn reset(&self) -> Result<()>;
}
