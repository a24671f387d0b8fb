//! Budget Tracker - Spend monitoring
//!
//! This module contains the BudgetTracker for monitoring paid API usage.

use super::ledger::{default_currency, round6, BudgetLedger, RequestEntry};
use super::pricing::{PriceTable, USD_TO_EUR};
use crate::governor::{Decision, Governor, Notice, Severity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tollgate_core::{local_midnight, Error, JsonStore, LedgerCell, Result, SharedClock};
use tracing::{debug, info};

/// Request records kept in the ledger by default
const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Characters of the caller note kept per history entry
const DEFAULT_NOTE_PREVIEW_CHARS: usize = 50;

/// Remaining amount below which a warning is shown
const LOW_REMAINING_THRESHOLD: f64 = 1.0;

/// Spent percentage above which a warning is shown
const HIGH_SPEND_PERCENTAGE: f64 = 90.0;

/// Days before expiry from which an informational notice is shown
const EXPIRY_NOTICE_DAYS: i64 = 30;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ============================================================================
// Configuration
// ============================================================================

/// Budget tracker configuration.
///
/// `total_budget`, `currency` and `valid_until` seed a new ledger; once a
/// ledger exists on disk its own values are authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Budget cap in `currency`
    #[serde(default = "default_total_budget")]
    pub total_budget: f64,
    /// Currency code of the budget
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Budget expires at the start of this local date
    #[serde(default = "default_valid_until")]
    pub valid_until: NaiveDate,
    /// Conversion from price-table currency to budget currency
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,
    /// History entries kept in the ledger
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Characters of the caller note kept per entry
    #[serde(default = "default_note_preview_chars")]
    pub note_preview_chars: usize,
    /// Unit prices
    #[serde(default)]
    pub prices: PriceTable,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            total_budget: default_total_budget(),
            currency: default_currency(),
            valid_until: default_valid_until(),
            exchange_rate: default_exchange_rate(),
            history_limit: default_history_limit(),
            note_preview_chars: default_note_preview_chars(),
            prices: PriceTable::default(),
        }
    }
}

fn default_total_budget() -> f64 {
    257.50
}
fn default_valid_until() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 23).unwrap_or(NaiveDate::MAX)
}
fn default_exchange_rate() -> f64 {
    USD_TO_EUR
}
fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}
fn default_note_preview_chars() -> usize {
    DEFAULT_NOTE_PREVIEW_CHARS
}

impl BudgetConfig {
    /// Config with a custom cap and expiry, defaults elsewhere
    #[must_use]
    pub fn new(total_budget: f64, valid_until: NaiveDate) -> Self {
        Self {
            total_budget,
            valid_until,
            ..Self::default()
        }
    }

    /// Reject a non-positive cap, rate or history size
    pub fn validate(&self) -> Result<()> {
        if self.total_budget.is_nan() || self.total_budget <= 0.0 {
            return Err(Error::Config("budget.total_budget must be > 0".to_string()));
        }
        if self.exchange_rate.is_nan() || self.exchange_rate <= 0.0 {
            return Err(Error::Config("budget.exchange_rate must be > 0".to_string()));
        }
        if self.history_limit == 0 {
            return Err(Error::Config("budget.history_limit must be > 0".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Views
// ============================================================================

/// Usage reported after a paid request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Model the request went to
    pub resource_id: String,
    /// Input tokens from the API response
    pub input_units: u64,
    /// Output tokens from the API response
    pub output_units: u64,
    /// Free-form note, truncated before storage
    pub note: String,
}

impl Usage {
    /// Usage without a note
    #[must_use]
    pub fn new(resource_id: impl Into<String>, input_units: u64, output_units: u64) -> Self {
        Self {
            resource_id: resource_id.into(),
            input_units,
            output_units,
            note: String::new(),
        }
    }
}

/// Result of recording a request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetUpdate {
    /// Cost of this request
    pub cost: f64,
    /// Total spent after the request
    pub spent: f64,
    /// Remaining after the request
    pub remaining: f64,
    /// Spent percentage after the request
    pub percentage: f64,
}

/// Read-only view of the budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// Budget cap
    pub total: f64,
    /// Amount spent
    pub spent: f64,
    /// Amount left
    pub remaining: f64,
    /// Currency code
    pub currency: String,
    /// Spent percentage
    pub percentage: f64,
    /// Requests recorded
    pub request_count: u64,
    /// Expiry date
    pub valid_until: NaiveDate,
    /// Whole days until expiry, rounded up
    pub days_remaining: i64,
    /// Average cost per recorded request
    pub average_cost: Option<f64>,
    /// Requests the remaining amount covers at the average cost
    pub estimated_remaining_requests: Option<u64>,
    /// Date of the last save
    pub last_updated: Option<NaiveDate>,
}

// ============================================================================
// BudgetTracker
// ============================================================================

/// Tracker for a capped, time-bounded monetary budget
#[derive(Debug)]
pub struct BudgetTracker {
    config: BudgetConfig,
    clock: SharedClock,
    cell: LedgerCell<BudgetLedger>,
}

impl BudgetTracker {
    /// Create a tracker persisted at `path`
    #[must_use]
    pub fn new(path: impl AsRef<Path>, config: BudgetConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            cell: LedgerCell::new("budget", JsonStore::new(path)),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Cost of a request in the budget currency.
    ///
    /// Unknown models are priced with the default row.
    #[must_use]
    pub fn cost(&self, resource_id: &str, input_units: u64, output_units: u64) -> f64 {
        let lookup = self.config.prices.lookup(resource_id);
        if lookup.fallback {
            debug!(model = resource_id, "No price for model, using default row");
        }
        let base = lookup.price.calculate_cost(input_units, output_units);
        (base * self.config.exchange_rate).max(0.0)
    }

    /// Charge a completed request against the budget
    pub fn record(
        &self,
        resource_id: &str,
        input_units: u64,
        output_units: u64,
        note: &str,
    ) -> BudgetUpdate {
        let cost = self.cost(resource_id, input_units, output_units);
        let now = self.clock.now();
        let preview: String = note.chars().take(self.config.note_preview_chars).collect();

        self.cell.update(
            || self.fresh(),
            |ledger| {
                ledger.charge(cost);
                ledger.push_history(
                    RequestEntry {
                        timestamp: now,
                        resource_id: resource_id.to_string(),
                        input_units,
                        output_units,
                        cost: round6(cost),
                        note: preview,
                    },
                    self.config.history_limit,
                );
                ledger.last_updated = Some(self.clock.today());

                debug!(
                    model = resource_id,
                    input_units,
                    output_units,
                    cost,
                    spent = ledger.spent,
                    remaining = ledger.remaining,
                    "Budget charged"
                );

                BudgetUpdate {
                    cost,
                    spent: ledger.spent,
                    remaining: ledger.remaining,
                    percentage: ledger.percentage(),
                }
            },
        )
    }

    /// Ask whether the budget allows another request.
    ///
    /// First match wins: exhausted and expired block; low remaining, high
    /// spend and approaching expiry only warn.
    pub fn check(&self) -> Decision<BudgetSnapshot> {
        let snapshot = self.stats();
        let b = &snapshot;

        if b.remaining <= 0.0 {
            return Decision::block("Budget exhausted! No further requests possible.", snapshot);
        }
        if b.days_remaining <= 0 {
            let message = format!("Budget expired as of {}.", b.valid_until);
            return Decision::block(message, snapshot);
        }

        let notice = if b.remaining < LOW_REMAINING_THRESHOLD {
            Some(Notice::new(
                Severity::Warning,
                format!("Warning: only {:.2} {} left!", b.remaining, b.currency),
            ))
        } else if b.percentage > HIGH_SPEND_PERCENTAGE {
            Some(Notice::new(
                Severity::Warning,
                format!("Warning: {:.1}% of the budget spent", b.percentage),
            ))
        } else if b.days_remaining <= EXPIRY_NOTICE_DAYS {
            Some(Notice::new(
                Severity::Info,
                format!("Notice: budget expires in {} days", b.days_remaining),
            ))
        } else {
            None
        };

        Decision::allow(notice, snapshot)
    }

    /// Current budget state
    pub fn stats(&self) -> BudgetSnapshot {
        let now = self.clock.now();
        self.cell
            .update(|| self.fresh(), |ledger| snapshot_of(ledger, now))
    }

    /// Admin/test only: zero the spend, keeping cap and expiry
    pub fn reset(&self) -> Result<()> {
        let mut ledger = self.cell.read(|| self.fresh());
        ledger.clear();
        ledger.last_updated = Some(self.clock.today());
        self.cell.replace(ledger)?;
        info!(path = ?self.cell.store().path(), "Budget reset");
        Ok(())
    }

    /// Persist an explicitly built ledger (admin and test seam)
    pub fn restore(&self, ledger: BudgetLedger) -> Result<()> {
        self.cell.replace(ledger)
    }

    /// Recent history entries, oldest first
    pub fn history(&self) -> Vec<RequestEntry> {
        self.cell
            .update(|| self.fresh(), |ledger| ledger.request_history.clone())
    }

    fn fresh(&self) -> BudgetLedger {
        BudgetLedger::new(
            self.config.total_budget,
            self.config.currency.clone(),
            self.config.valid_until,
        )
    }
}

/// Days until `valid_until`, rounded up
fn days_until(valid_until: NaiveDate, now: DateTime<Utc>) -> i64 {
    let millis = (local_midnight(valid_until) - now).num_milliseconds();
    (millis as f64 / MILLIS_PER_DAY).ceil() as i64
}

fn snapshot_of(ledger: &BudgetLedger, now: DateTime<Utc>) -> BudgetSnapshot {
    let remaining = round6(ledger.total_budget - ledger.spent);
    let average_cost = (ledger.request_count > 0).then(|| ledger.spent / ledger.request_count as f64);
    let estimated_remaining_requests = average_cost
        .filter(|avg| *avg > 0.0)
        .map(|avg| (remaining.max(0.0) / avg).floor() as u64);

    BudgetSnapshot {
        total: ledger.total_budget,
        spent: ledger.spent,
        remaining,
        currency: ledger.currency.clone(),
        percentage: ledger.percentage(),
        request_count: ledger.request_count,
        valid_until: ledger.valid_until,
        days_remaining: days_until(ledger.valid_until, now),
        average_cost,
        estimated_remaining_requests,
        last_updated: ledger.last_updated,
    }
}

impl Governor for BudgetTracker {
    type Outcome = Usage;
    type Stats = BudgetSnapshot;

    fn check_allowed(&self) -> Decision<BudgetSnapshot> {
        self.check()
    }

    fn record(&self, usage: Usage) {
        BudgetTracker::record(
            self,
            &usage.resource_id,
            usage.input_units,
            usage.output_units,
            &usage.note,
        );
    }

    fn stats(&self) -> BudgetSnapshot {
        BudgetTracker::stats(self)
    }

    fn reset(&self) -> Result<()> {
        BudgetTracker::reset(self)
    }
}
