use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tempfile::TempDir;

use tollgate_core::{Clock, ManualClock, SharedClock};
use tollgate_governor::{
    AvailabilityConfig, AvailabilityTracker, BudgetConfig, BudgetTracker, Governor, QuotaConfig,
    QuotaCounter, ResourceOutcome, Usage,
};

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at_local(2026, 5, 4, 10, 30).unwrap())
}

#[test]
fn test_two_quota_counters_share_one_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quota.json");
    let clock = clock();

    // Two short-lived "processes" pointing at the same ledger
    let a = QuotaCounter::new(&path, QuotaConfig::with_limit(5), clock.clone());
    let b = QuotaCounter::new(&path, QuotaConfig::with_limit(5), clock.clone());

    a.record();
    b.record();
    a.record();
    b.record();
    assert_eq!(a.stats().used, 4);
    assert_eq!(b.stats().used, 4);

    b.record();
    assert!(!a.can_proceed().allowed);

    // Day boundary seen first by `a` is also seen by `b`
    clock.advance(Duration::days(1));
    assert!(a.can_proceed().allowed);
    assert_eq!(b.stats().used, 0);
    assert_eq!(b.stats().day, clock.today());
}

#[test]
fn test_two_budget_trackers_share_one_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("budget.json");
    let clock = clock();
    let config = BudgetConfig::new(10.0, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());

    let a = BudgetTracker::new(&path, config.clone(), clock.clone());
    let b = BudgetTracker::new(&path, config, clock.clone());

    a.record("gemini-2.0-flash", 1_000_000, 0, "first");
    b.record("gemini-2.0-flash", 1_000_000, 0, "second");

    let snapshot = a.stats();
    assert_eq!(snapshot.request_count, 2);
    assert!((snapshot.spent - 0.644).abs() < 1e-6);
    assert_eq!(b.history().len(), 2);
}

#[test]
fn test_two_availability_trackers_share_one_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("availability.json");
    let clock = clock();

    let a = AvailabilityTracker::new(&path, AvailabilityConfig::default(), clock.clone());
    let b = AvailabilityTracker::new(&path, AvailabilityConfig::default(), clock.clone());

    a.record_success("x", 10);
    b.record_error("x", 429, "limited");
    a.record_success("y", 20);

    let overview = b.overview();
    assert_eq!(overview.total_resources, 2);
    assert_eq!(overview.total_requests, 3);
    assert_eq!(a.resource("x").unwrap().failed_requests, 1);
}

#[test]
fn test_governors_drive_the_same_way() {
    let dir = TempDir::new().unwrap();
    let clock: SharedClock = clock();

    let quota = QuotaCounter::new(
        dir.path().join("q.json"),
        QuotaConfig::with_limit(2),
        clock.clone(),
    );
    let budget = BudgetTracker::new(
        dir.path().join("b.json"),
        BudgetConfig::new(1.0, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()),
        clock.clone(),
    );
    let pool = AvailabilityTracker::new(
        dir.path().join("a.json"),
        AvailabilityConfig::default(),
        clock,
    );

    let mut calls = 0;
    while quota.check_allowed().allowed && budget.check_allowed().allowed {
        calls += 1;
        Governor::record(&quota, 100);
        Governor::record(&budget, Usage::new("gemini-1.5-pro", 1_000, 1_000));
        Governor::record(
            &pool,
            ResourceOutcome::Success {
                resource_id: "gemini-1.5-pro".to_string(),
                units: 2_000,
            },
        );
    }

    assert_eq!(calls, 2);
    assert_eq!(Governor::stats(&quota).total_units, 200);
    assert_eq!(Governor::stats(&budget).request_count, 2);
    assert_eq!(Governor::stats(&pool).successful_requests, 2);

    Governor::reset(&quota).unwrap();
    assert!(quota.check_allowed().allowed);
}

#[test]
fn test_unwritable_store_keeps_working_in_memory() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();
    let clock = clock();

    let counter = QuotaCounter::new(
        blocker.join("quota.json"),
        QuotaConfig::with_limit(3),
        clock,
    );

    counter.record();
    counter.record();
    assert_eq!(counter.stats().used, 2);
    counter.record();
    assert!(!counter.can_proceed().allowed);
    assert!(counter.reset().is_err());
}
