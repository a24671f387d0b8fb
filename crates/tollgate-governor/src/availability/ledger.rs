//! Availability Ledger
//!
//! Timestamps are stored as epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cached availability classification of a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Never called yet
    #[default]
    Unknown,
    /// Last outcome was a success
    Available,
    /// Last rate-limit error (429) not yet followed by a success
    RateLimited,
    /// Terminal failure (404); stays until the ledger is reset
    Unavailable,
}

impl Availability {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Available => "available",
            Self::RateLimited => "rate_limited",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most recent failure of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    /// HTTP-style status code
    pub code: u16,
    /// Error message from the provider
    #[serde(default)]
    pub message: String,
    /// When the error was recorded
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Per-resource counters.
///
/// `requests == successful_requests + failed_requests` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// Calls observed today
    #[serde(default)]
    pub requests: u64,
    /// Successful calls
    #[serde(default)]
    pub successful_requests: u64,
    /// Failed calls
    #[serde(default)]
    pub failed_requests: u64,
    /// Units (tokens) consumed by successful calls
    #[serde(default, alias = "totalTokens")]
    pub total_units: u64,
    /// Last successful call
    #[serde(
        default,
        alias = "lastUsed",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Last failure
    #[serde(default)]
    pub last_error: Option<LastError>,
    /// Errors not yet healed by successes
    #[serde(default, alias = "errorCount")]
    pub error_streak: u64,
    /// Cached classification
    #[serde(default)]
    pub availability: Availability,
}

impl ResourceRecord {
    /// Successful fraction of calls (0.0 when never called)
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.requests as f64
    }

    /// Average units per successful call, rounded
    #[must_use]
    pub fn average_units(&self) -> u64 {
        if self.successful_requests == 0 {
            return 0;
        }
        (self.total_units as f64 / self.successful_requests as f64).round() as u64
    }

    pub(super) fn apply_success(&mut self, units: u64, now: DateTime<Utc>) {
        self.requests += 1;
        self.successful_requests += 1;
        self.total_units = self.total_units.saturating_add(units);
        self.last_used_at = Some(now);
        self.error_streak = self.error_streak.saturating_sub(1);
        if self.availability != Availability::Unavailable {
            self.availability = Availability::Available;
        }
    }

    pub(super) fn apply_error(&mut self, code: u16, message: &str, now: DateTime<Utc>) {
        self.requests += 1;
        self.failed_requests += 1;
        self.error_streak += 1;
        self.last_error = Some(LastError {
            code,
            message: message.to_string(),
            timestamp: now,
        });
        match code {
            429 => self.availability = Availability::RateLimited,
            404 => self.availability = Availability::Unavailable,
            _ => {}
        }
    }
}

/// Persisted pool state, keyed by resource identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityLedger {
    /// Resources observed today
    #[serde(default)]
    pub models: BTreeMap<String, ResourceRecord>,
    /// Local midnight the ledger was last reset at
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_reset: DateTime<Utc>,
    /// Calls observed today across all resources
    #[serde(default)]
    pub total_requests: u64,
}

impl AvailabilityLedger {
    /// Empty ledger starting at `last_reset`
    #[must_use]
    pub fn new(last_reset: DateTime<Utc>) -> Self {
        Self {
            models: BTreeMap::new(),
            last_reset,
            total_requests: 0,
        }
    }

    /// Record for `resource_id`, created on first observation
    pub(super) fn entry(&mut self, resource_id: &str) -> &mut ResourceRecord {
        self.models.entry(resource_id.to_string()).or_default()
    }
}
