//! Fixed-Quota Counter
//!
//! Daily request-count accounting against a hard limit (e.g. the Groq free
//! tier's 14,400 requests/day). The counter rolls over lazily at local
//! midnight and fires each warning threshold at most once per day.

use crate::governor::{Decision, Governor, Notice, Severity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tollgate_core::{Error, JsonStore, LedgerCell, Result, SharedClock};
use tracing::{debug, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Default daily request limit (Groq free tier)
pub const DEFAULT_DAILY_LIMIT: u64 = 14_400;

/// Fraction of the limit that triggers the informational notice
pub const DEFAULT_LOW_THRESHOLD: f64 = 0.80;

/// Fraction of the limit that triggers the warning notice
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 0.90;

/// Fraction of the limit that triggers the critical notice
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.95;

// ============================================================================
// Configuration
// ============================================================================

/// Warning thresholds as fractions of the daily limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarningThresholds {
    /// Informational notice
    #[serde(default = "default_low")]
    pub low: f64,
    /// Warning notice
    #[serde(default = "default_medium")]
    pub medium: f64,
    /// Critical notice
    #[serde(default = "default_high")]
    pub high: f64,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            low: default_low(),
            medium: default_medium(),
            high: default_high(),
        }
    }
}

fn default_low() -> f64 {
    DEFAULT_LOW_THRESHOLD
}
fn default_medium() -> f64 {
    DEFAULT_MEDIUM_THRESHOLD
}
fn default_high() -> f64 {
    DEFAULT_HIGH_THRESHOLD
}

/// Quota counter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Requests allowed per local calendar day
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u64,
    /// Warning thresholds
    #[serde(default)]
    pub thresholds: WarningThresholds,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            thresholds: WarningThresholds::default(),
        }
    }
}

fn default_daily_limit() -> u64 {
    DEFAULT_DAILY_LIMIT
}

impl QuotaConfig {
    /// Config with a custom daily limit and default thresholds
    #[must_use]
    pub fn with_limit(daily_limit: u64) -> Self {
        Self {
            daily_limit,
            ..Self::default()
        }
    }

    /// Reject a zero limit or thresholds that are out of order
    pub fn validate(&self) -> Result<()> {
        if self.daily_limit == 0 {
            return Err(Error::Config("quota.daily_limit must be > 0".to_string()));
        }
        let t = &self.thresholds;
        let ordered = 0.0 < t.low && t.low <= t.medium && t.medium <= t.high && t.high <= 1.0;
        if !ordered {
            return Err(Error::Config(format!(
                "quota.thresholds must satisfy 0 < low <= medium <= high <= 1 (got {}, {}, {})",
                t.low, t.medium, t.high
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Which thresholds already fired today
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningsFired {
    /// Informational threshold fired
    #[serde(default)]
    pub low: bool,
    /// Warning threshold fired
    #[serde(default)]
    pub medium: bool,
    /// Critical threshold fired
    #[serde(default)]
    pub high: bool,
}

/// Persisted daily counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLedger {
    /// Local calendar day the counters apply to
    #[serde(alias = "date")]
    pub day: NaiveDate,
    /// Requests consumed today
    #[serde(default)]
    pub count: u64,
    /// Daily limit
    #[serde(default = "default_daily_limit")]
    pub limit: u64,
    /// First recorded request today
    #[serde(default, alias = "firstRequest")]
    pub first_request_at: Option<DateTime<Utc>>,
    /// Most recent recorded request
    #[serde(default, alias = "lastRequest")]
    pub last_request_at: Option<DateTime<Utc>>,
    /// Thresholds already announced today
    #[serde(default, alias = "warnings")]
    pub warnings_fired: WarningsFired,
    /// Units (tokens) consumed today
    #[serde(default, alias = "totalTokens")]
    pub total_units: u64,
}

impl QuotaLedger {
    /// Zeroed ledger for `day`
    #[must_use]
    pub fn new(day: NaiveDate, limit: u64) -> Self {
        Self {
            day,
            count: 0,
            limit,
            first_request_at: None,
            last_request_at: None,
            warnings_fired: WarningsFired::default(),
            total_units: 0,
        }
    }

    /// Used fraction of the limit (0.0 – 1.0+)
    #[must_use]
    pub fn usage_ratio(&self) -> f64 {
        if self.limit == 0 {
            return 1.0;
        }
        self.count as f64 / self.limit as f64
    }

    /// Requests left today
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.count)
    }
}

/// Read-only view of today's usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaStats {
    /// Day the counters apply to
    pub day: NaiveDate,
    /// Requests used today
    pub used: u64,
    /// Requests left today
    pub remaining: u64,
    /// Daily limit
    pub limit: u64,
    /// Used percentage, one decimal place
    pub percentage: f64,
    /// First recorded request today
    pub first_request_at: Option<DateTime<Utc>>,
    /// Most recent recorded request
    pub last_request_at: Option<DateTime<Utc>>,
    /// Units consumed today
    pub total_units: u64,
    /// Next local midnight
    pub next_reset: DateTime<Utc>,
    /// Seconds until the next reset
    pub resets_in_secs: i64,
}

// ============================================================================
// QuotaCounter
// ============================================================================

/// Daily hard-limit request counter
#[derive(Debug)]
pub struct QuotaCounter {
    config: QuotaConfig,
    clock: SharedClock,
    cell: LedgerCell<QuotaLedger>,
}

impl QuotaCounter {
    /// Create a counter persisted at `path`
    #[must_use]
    pub fn new(path: impl AsRef<Path>, config: QuotaConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            cell: LedgerCell::new("quota", JsonStore::new(path)),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Ask whether another request may be made today.
    ///
    /// Blocks once `count >= limit`. Otherwise returns at most one newly
    /// crossed threshold notice, highest first; each fires once per day.
    pub fn can_proceed(&self) -> Decision<QuotaStats> {
        self.with_current(|counter, ledger| {
            let stats = counter.stats_of(ledger);

            if ledger.count >= ledger.limit {
                debug!(count = ledger.count, limit = ledger.limit, "Quota exhausted");
                return Decision::block(
                    format!(
                        "Daily limit reached! ({}/{}) Resets at local midnight (00:00).",
                        ledger.count, ledger.limit
                    ),
                    stats,
                );
            }

            let notice = counter.fire_threshold(ledger);
            Decision::allow(notice, stats)
        })
    }

    /// Record one successful request.
    ///
    /// Call only after the external call succeeded; failed calls must not
    /// be counted.
    pub fn record(&self) {
        self.record_units(0);
    }

    /// Record one successful request that consumed `units` (e.g. tokens)
    pub fn record_units(&self, units: u64) {
        let now = self.clock.now();
        self.with_current(|_, ledger| {
            if ledger.count >= ledger.limit {
                warn!(
                    count = ledger.count,
                    limit = ledger.limit,
                    "Request recorded past the daily limit, not counting it"
                );
                return;
            }
            ledger.count += 1;
            ledger.total_units = ledger.total_units.saturating_add(units);
            ledger.first_request_at.get_or_insert(now);
            ledger.last_request_at = Some(now);
            debug!(count = ledger.count, limit = ledger.limit, units, "Request recorded");
        });
    }

    /// Today's usage (rolls the counter over first if the day changed)
    pub fn stats(&self) -> QuotaStats {
        self.with_current(|counter, ledger| counter.stats_of(ledger))
    }

    /// Admin only: start today from zero
    pub fn reset(&self) -> Result<()> {
        self.cell.replace(self.fresh())?;
        info!(path = ?self.cell.store().path(), "Quota counter reset");
        Ok(())
    }

    /// Persist an explicitly built ledger (admin and test seam)
    pub fn restore(&self, ledger: QuotaLedger) -> Result<()> {
        self.cell.replace(ledger)
    }

    fn fresh(&self) -> QuotaLedger {
        QuotaLedger::new(self.clock.today(), self.config.daily_limit)
    }

    /// Load, roll over, sync the limit, then run `f`
    fn with_current<R>(&self, f: impl FnOnce(&Self, &mut QuotaLedger) -> R) -> R {
        self.cell.update(
            || self.fresh(),
            |ledger| {
                let today = self.clock.today();
                if ledger.day != today {
                    info!(from = %ledger.day, to = %today, "New day detected, resetting quota counter");
                    *ledger = self.fresh();
                }
                ledger.limit = self.config.daily_limit;
                f(self, ledger)
            },
        )
    }

    fn fire_threshold(&self, ledger: &mut QuotaLedger) -> Option<Notice> {
        let ratio = ledger.usage_ratio();
        let remaining = ledger.remaining();
        let t = self.config.thresholds;
        let fired = &mut ledger.warnings_fired;

        if ratio >= t.high && !fired.high {
            fired.high = true;
            return Some(Notice::new(
                Severity::Critical,
                format!(
                    "CRITICAL: {:.0}% of the daily limit reached! Only {} requests left today!",
                    t.high * 100.0,
                    remaining
                ),
            ));
        }

        if ratio >= t.medium && !fired.medium {
            fired.medium = true;
            return Some(Notice::new(
                Severity::Warning,
                format!(
                    "WARNING: {:.0}% of the daily limit reached! {} requests remaining.",
                    t.medium * 100.0,
                    remaining
                ),
            ));
        }

        if ratio >= t.low && !fired.low {
            fired.low = true;
            return Some(Notice::new(
                Severity::Info,
                format!(
                    "Info: {:.0}% of the daily limit reached. {} requests remaining.",
                    t.low * 100.0,
                    remaining
                ),
            ));
        }

        None
    }

    fn stats_of(&self, ledger: &QuotaLedger) -> QuotaStats {
        let next_reset = self.clock.next_midnight();
        QuotaStats {
            day: ledger.day,
            used: ledger.count,
            remaining: ledger.remaining(),
            limit: ledger.limit,
            percentage: (ledger.usage_ratio() * 1000.0).round() / 10.0,
            first_request_at: ledger.first_request_at,
            last_request_at: ledger.last_request_at,
            total_units: ledger.total_units,
            next_reset,
            resets_in_secs: (next_reset - self.clock.now()).num_seconds(),
        }
    }
}

impl Governor for QuotaCounter {
    type Outcome = u64;
    type Stats = QuotaStats;

    fn check_allowed(&self) -> Decision<QuotaStats> {
        self.can_proceed()
    }

    fn record(&self, units: u64) {
        self.record_units(units);
    }

    fn stats(&self) -> QuotaStats {
        QuotaCounter::stats(self)
    }

    fn reset(&self) -> Result<()> {
        QuotaCounter::reset(self)
    }
}
