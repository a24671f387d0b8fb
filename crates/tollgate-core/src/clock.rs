//! Clock - "now" and local day boundaries
//!
//! Every per-day ledger rolls over at local midnight. Trackers never read
//! the system time directly; they ask a [`Clock`], so tests can move time
//! across day boundaries and cool-down windows.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared clock handle passed into trackers
pub type SharedClock = Arc<dyn Clock>;

/// Source of the current instant.
///
/// Day arithmetic is provided on top of [`Clock::now`] and always uses the
/// process-local time zone.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Current local calendar date
    fn today(&self) -> NaiveDate {
        local_date(self.now())
    }

    /// Instant of the most recent local midnight
    fn start_of_day(&self) -> DateTime<Utc> {
        start_of_local_day(self.now())
    }

    /// Instant of the next local midnight
    fn next_midnight(&self) -> DateTime<Utc> {
        next_local_midnight(self.now())
    }

    /// Time left until the next local midnight
    fn until_next_midnight(&self) -> Duration {
        self.next_midnight() - self.now()
    }
}

/// Local calendar date of an instant
#[must_use]
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Instant at which `date` begins in local time.
///
/// Zones that skip midnight on a DST change start the day at the first
/// valid local time after it.
#[must_use]
pub fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
        })
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Local midnight at or before `instant`
#[must_use]
pub fn start_of_local_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    local_midnight(local_date(instant))
}

/// First local midnight strictly after `instant`
#[must_use]
pub fn next_local_midnight(instant: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = local_date(instant).succ_opt().unwrap_or(NaiveDate::MAX);
    local_midnight(tomorrow)
}

// ============================================================================
// Implementations
// ============================================================================

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replays
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `at`
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(at) }
    }

    /// Create a clock frozen at a local wall-clock time.
    ///
    /// Returns `None` when the time does not exist in the local zone.
    #[must_use]
    pub fn at_local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        Local
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .earliest()
            .map(|t| Self::new(t.with_timezone(&Utc)))
    }

    /// Jump to `at`
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    /// Move forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
