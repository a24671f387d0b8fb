//! Availability Tracker - Ranked pool of free models
//!
//! There is no global cutoff in this regime: [`AvailabilityTracker`] only
//! ranks resources by success rate so the caller can pick one.

use super::ledger::{Availability, AvailabilityLedger, LastError, ResourceRecord};
use crate::governor::{Decision, Governor, Notice, Severity};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tollgate_core::{Error, JsonStore, LedgerCell, Result, SharedClock};
use tracing::{debug, info};

/// Seconds after a rate-limit error before a resource is ranked again
const DEFAULT_COOL_DOWN_SECS: u64 = 300;

/// Resources returned by [`AvailabilityTracker::best`]
const DEFAULT_RANK_COUNT: usize = 3;

// ============================================================================
// Configuration
// ============================================================================

/// Availability tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    /// Cool-down window after a 429, in seconds
    #[serde(default = "default_cool_down_secs")]
    pub cool_down_secs: u64,
    /// Result size of [`AvailabilityTracker::best`]
    #[serde(default = "default_rank_count")]
    pub default_rank_count: usize,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            cool_down_secs: default_cool_down_secs(),
            default_rank_count: default_rank_count(),
        }
    }
}

fn default_cool_down_secs() -> u64 {
    DEFAULT_COOL_DOWN_SECS
}
fn default_rank_count() -> usize {
    DEFAULT_RANK_COUNT
}

impl AvailabilityConfig {
    /// Reject an empty default ranking
    pub fn validate(&self) -> Result<()> {
        if self.default_rank_count == 0 {
            return Err(Error::Config(
                "availability.default_rank_count must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    fn cool_down(&self) -> Duration {
        Duration::seconds(i64::try_from(self.cool_down_secs).unwrap_or(i64::MAX))
    }
}

// ============================================================================
// Views
// ============================================================================

/// Outcome of one call to a pooled resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceOutcome {
    /// The call succeeded and consumed `units`
    Success {
        /// Resource identifier
        resource_id: String,
        /// Units (tokens) consumed
        units: u64,
    },
    /// The call failed with an HTTP-style status code
    Error {
        /// Resource identifier
        resource_id: String,
        /// Status code
        code: u16,
        /// Provider message
        message: String,
    },
}

/// One resource with derived statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStats {
    /// Resource identifier
    pub id: String,
    /// Calls observed today
    pub requests: u64,
    /// Successful calls
    pub successful_requests: u64,
    /// Failed calls
    pub failed_requests: u64,
    /// Units consumed
    pub total_units: u64,
    /// Last successful call
    pub last_used_at: Option<DateTime<Utc>>,
    /// Last failure
    pub last_error: Option<LastError>,
    /// Errors not yet healed
    pub error_streak: u64,
    /// Cached classification
    pub availability: Availability,
    /// Successful fraction of calls (0.0 – 1.0)
    pub success_rate: f64,
    /// Average units per successful call
    pub average_units: u64,
}

impl ResourceStats {
    fn of(id: &str, record: &ResourceRecord) -> Self {
        Self {
            id: id.to_string(),
            requests: record.requests,
            successful_requests: record.successful_requests,
            failed_requests: record.failed_requests,
            total_units: record.total_units,
            last_used_at: record.last_used_at,
            last_error: record.last_error.clone(),
            error_streak: record.error_streak,
            availability: record.availability,
            success_rate: record.success_rate(),
            average_units: record.average_units(),
        }
    }
}

/// Aggregate view of the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityOverview {
    /// Resources observed today
    pub total_resources: usize,
    /// Resources currently eligible for ranking
    pub available_count: usize,
    /// Calls observed today
    pub total_requests: u64,
    /// Successful calls across all resources
    pub successful_requests: u64,
    /// Failed calls across all resources
    pub failed_requests: u64,
    /// Successful fraction of all calls (0.0 – 1.0)
    pub success_rate: f64,
    /// Last reset
    pub last_reset: DateTime<Utc>,
    /// Next local midnight
    pub next_reset: DateTime<Utc>,
}

// ============================================================================
// AvailabilityTracker
// ============================================================================

/// Per-resource success/failure tracker with a ranked query
#[derive(Debug)]
pub struct AvailabilityTracker {
    config: AvailabilityConfig,
    clock: SharedClock,
    cell: LedgerCell<AvailabilityLedger>,
}

impl AvailabilityTracker {
    /// Create a tracker persisted at `path`
    #[must_use]
    pub fn new(path: impl AsRef<Path>, config: AvailabilityConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            cell: LedgerCell::new("availability", JsonStore::new(path)),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &AvailabilityConfig {
        &self.config
    }

    /// Record a successful call.
    ///
    /// Heals one step of the error streak and marks the resource available,
    /// unless it was marked unavailable.
    pub fn record_success(&self, resource_id: &str, units: u64) {
        let now = self.clock.now();
        self.with_current(|ledger| {
            let record = ledger.entry(resource_id);
            record.apply_success(units, now);
            debug!(
                model = resource_id,
                units,
                availability = %record.availability,
                "Success recorded"
            );
            ledger.total_requests += 1;
        });
    }

    /// Record a failed call.
    ///
    /// 429 marks the resource rate limited, 404 marks it unavailable; other
    /// codes only count the failure.
    pub fn record_error(&self, resource_id: &str, code: u16, message: &str) {
        let now = self.clock.now();
        self.with_current(|ledger| {
            let record = ledger.entry(resource_id);
            record.apply_error(code, message, now);
            debug!(
                model = resource_id,
                code,
                error_streak = record.error_streak,
                availability = %record.availability,
                "Error recorded"
            );
            ledger.total_requests += 1;
        });
    }

    /// All eligible resources, best success rate first.
    ///
    /// Eligible means available, unknown, or rate limited with the last
    /// error older than the cool-down window. Ties keep identifier order.
    pub fn available(&self) -> Vec<ResourceStats> {
        let now = self.clock.now();
        self.with_current(|ledger| self.rank(ledger, now))
    }

    /// Top `n` of [`AvailabilityTracker::available`]
    pub fn ranked_available(&self, n: usize) -> Vec<ResourceStats> {
        let mut ranked = self.available();
        ranked.truncate(n);
        ranked
    }

    /// Top `default_rank_count` eligible resources
    pub fn best(&self) -> Vec<ResourceStats> {
        self.ranked_available(self.config.default_rank_count)
    }

    /// Statistics for one resource, if it was observed today
    pub fn resource(&self, resource_id: &str) -> Option<ResourceStats> {
        self.with_current(|ledger| {
            ledger
                .models
                .get(resource_id)
                .map(|record| ResourceStats::of(resource_id, record))
        })
    }

    /// Aggregate statistics
    pub fn overview(&self) -> AvailabilityOverview {
        let now = self.clock.now();
        self.with_current(|ledger| {
            let successful_requests = ledger.models.values().map(|r| r.successful_requests).sum();
            let failed_requests = ledger.models.values().map(|r| r.failed_requests).sum();
            let success_rate = if ledger.total_requests > 0 {
                successful_requests as f64 / ledger.total_requests as f64
            } else {
                0.0
            };

            AvailabilityOverview {
                total_resources: ledger.models.len(),
                available_count: self.rank(ledger, now).len(),
                total_requests: ledger.total_requests,
                successful_requests,
                failed_requests,
                success_rate,
                last_reset: ledger.last_reset,
                next_reset: self.clock.next_midnight(),
            }
        })
    }

    /// Admin only: forget every resource
    pub fn reset(&self) -> Result<()> {
        self.cell.replace(self.fresh())?;
        info!(path = ?self.cell.store().path(), "Availability tracker reset");
        Ok(())
    }

    /// Persist an explicitly built ledger (admin and test seam)
    pub fn restore(&self, ledger: AvailabilityLedger) -> Result<()> {
        self.cell.replace(ledger)
    }

    fn fresh(&self) -> AvailabilityLedger {
        AvailabilityLedger::new(self.clock.start_of_day())
    }

    /// Load, apply the daily reset, then run `f`
    fn with_current<R>(&self, f: impl FnOnce(&mut AvailabilityLedger) -> R) -> R {
        self.cell.update(
            || self.fresh(),
            |ledger| {
                let start_of_day = self.clock.start_of_day();
                if ledger.last_reset < start_of_day {
                    info!(
                        resources = ledger.models.len(),
                        total_requests = ledger.total_requests,
                        "New day detected, resetting availability tracker"
                    );
                    *ledger = AvailabilityLedger::new(start_of_day);
                }
                f(ledger)
            },
        )
    }

    fn is_eligible(&self, record: &ResourceRecord, now: DateTime<Utc>) -> bool {
        match record.availability {
            Availability::Available | Availability::Unknown => true,
            Availability::RateLimited => record
                .last_error
                .as_ref()
                .is_none_or(|e| now - e.timestamp >= self.config.cool_down()),
            Availability::Unavailable => false,
        }
    }

    fn rank(&self, ledger: &AvailabilityLedger, now: DateTime<Utc>) -> Vec<ResourceStats> {
        let mut ranked: Vec<ResourceStats> = ledger
            .models
            .iter()
            .filter(|(_, record)| self.is_eligible(record, now))
            .map(|(id, record)| ResourceStats::of(id, record))
            .collect();
        // Stable sort: equal rates stay in identifier order
        ranked.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));
        ranked
    }
}

impl Governor for AvailabilityTracker {
    type Outcome = ResourceOutcome;
    type Stats = AvailabilityOverview;

    /// Always allowed; warns when every observed resource is ineligible
    fn check_allowed(&self) -> Decision<AvailabilityOverview> {
        let overview = self.overview();
        let notice = (overview.total_resources > 0 && overview.available_count == 0)
            .then(|| Notice::new(Severity::Warning, "No available models!"));
        Decision::allow(notice, overview)
    }

    fn record(&self, outcome: ResourceOutcome) {
        match outcome {
            ResourceOutcome::Success { resource_id, units } => {
                self.record_success(&resource_id, units);
            }
            ResourceOutcome::Error {
                resource_id,
                code,
                message,
            } => self.record_error(&resource_id, code, &message),
        }
    }

    fn stats(&self) -> AvailabilityOverview {
        self.overview()
    }

    fn reset(&self) -> Result<()> {
        AvailabilityTracker::reset(self)
    }
}
