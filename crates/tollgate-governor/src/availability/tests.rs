use super::*;
use crate::governor::{Governor, Severity};
use chrono::Duration;
use std::sync::Arc;
use tempfile::TempDir;
use tollgate_core::{Clock, JsonStore, ManualClock};

fn setup() -> (TempDir, Arc<ManualClock>, AvailabilityTracker) {
    let temp_dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::at_local(2026, 3, 10, 9, 0).unwrap());
    let tracker = AvailabilityTracker::new(
        temp_dir.path().join("availability.json"),
        AvailabilityConfig::default(),
        clock.clone(),
    );
    (temp_dir, clock, tracker)
}

fn ids(stats: &[ResourceStats]) -> Vec<&str> {
    stats.iter().map(|s| s.id.as_str()).collect()
}

#[test]
fn test_success_marks_available() {
    let (_dir, _clock, tracker) = setup();

    tracker.record_success("meta/llama", 120);

    let stats = tracker.resource("meta/llama").unwrap();
    assert_eq!(stats.availability, Availability::Available);
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.successful_requests, 1);
    assert_eq!(stats.total_units, 120);
    assert!(stats.last_used_at.is_some());
    assert!((stats.success_rate - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_unknown_resource_has_no_stats() {
    let (_dir, _clock, tracker) = setup();
    assert!(tracker.resource("nobody").is_none());
}

#[test]
fn test_rate_limit_then_success() {
    let (_dir, _clock, tracker) = setup();

    tracker.record_error("m", 429, "Too Many Requests");
    let stats = tracker.resource("m").unwrap();
    assert_eq!(stats.availability, Availability::RateLimited);
    assert_eq!(stats.error_streak, 1);
    assert_eq!(stats.last_error.as_ref().unwrap().code, 429);

    tracker.record_success("m", 10);
    let stats = tracker.resource("m").unwrap();
    assert_eq!(stats.availability, Availability::Available);
    assert_eq!(stats.error_streak, 0);
    assert_eq!(stats.requests, 2);
}

#[test]
fn test_success_heals_one_error_at_a_time() {
    let (_dir, _clock, tracker) = setup();

    for _ in 0..3 {
        tracker.record_error("m", 500, "boom");
    }
    tracker.record_success("m", 0);

    let stats = tracker.resource("m").unwrap();
    assert_eq!(stats.error_streak, 2);
    assert_eq!(stats.failed_requests, 3);
    assert!(stats.last_error.is_some());
}

#[test]
fn test_other_codes_keep_availability() {
    let (_dir, _clock, tracker) = setup();

    tracker.record_error("fresh", 500, "server error");
    assert_eq!(tracker.resource("fresh").unwrap().availability, Availability::Unknown);

    tracker.record_success("warm", 1);
    tracker.record_error("warm", 503, "overloaded");
    assert_eq!(tracker.resource("warm").unwrap().availability, Availability::Available);
}

#[test]
fn test_not_found_is_sticky() {
    let (_dir, _clock, tracker) = setup();

    tracker.record_error("gone", 404, "No endpoints found");
    tracker.record_success("gone", 50);

    let stats = tracker.resource("gone").unwrap();
    assert_eq!(stats.availability, Availability::Unavailable);
    assert_eq!(stats.successful_requests, 1);
    assert!(tracker.available().is_empty());
}

#[test]
fn test_requests_equal_successes_plus_failures() {
    let (_dir, _clock, tracker) = setup();
    let codes = [0, 429, 0, 500, 404, 0, 0, 429];

    for (i, code) in codes.iter().enumerate() {
        let id = format!("m{}", i % 3);
        if *code == 0 {
            tracker.record_success(&id, 10);
        } else {
            tracker.record_error(&id, *code, "err");
        }
    }

    for i in 0..3 {
        let stats = tracker.resource(&format!("m{}", i)).unwrap();
        assert_eq!(stats.requests, stats.successful_requests + stats.failed_requests);
    }
    assert_eq!(tracker.overview().total_requests, codes.len() as u64);
}

#[test]
fn test_ranking_by_success_rate() {
    let (_dir, _clock, tracker) = setup();

    // a: 1/2, b: 3/3, c: 2/3
    tracker.record_success("a", 0);
    tracker.record_error("a", 500, "");
    for _ in 0..3 {
        tracker.record_success("b", 0);
    }
    tracker.record_success("c", 0);
    tracker.record_success("c", 0);
    tracker.record_error("c", 502, "");

    assert_eq!(ids(&tracker.available()), vec!["b", "c", "a"]);
    assert_eq!(ids(&tracker.ranked_available(2)), vec!["b", "c"]);
    assert_eq!(ids(&tracker.ranked_available(10)).len(), 3);
}

#[test]
fn test_ranking_ties_keep_identifier_order() {
    let (_dir, _clock, tracker) = setup();

    for id in ["zeta", "alpha", "mid"] {
        tracker.record_success(id, 0);
    }

    let first = ids(&tracker.available()).join(",");
    assert_eq!(first, "alpha,mid,zeta");
    for _ in 0..5 {
        assert_eq!(ids(&tracker.available()).join(","), first);
    }
}

#[test]
fn test_unknown_resources_are_eligible() {
    let (_dir, _clock, tracker) = setup();

    tracker.record_error("never-succeeded", 500, "");
    let ranked = tracker.available();
    assert_eq!(ids(&ranked), vec!["never-succeeded"]);
    assert_eq!(ranked[0].success_rate, 0.0);
}

#[test]
fn test_rate_limited_cool_down() {
    let (_dir, clock, tracker) = setup();

    tracker.record_error("limited", 429, "slow down");
    assert!(tracker.available().is_empty());

    clock.advance(Duration::seconds(299));
    assert!(tracker.available().is_empty());

    clock.advance(Duration::seconds(1));
    assert_eq!(ids(&tracker.available()), vec!["limited"]);
    // Eligibility does not rewrite the stored state
    assert_eq!(tracker.resource("limited").unwrap().availability, Availability::RateLimited);
}

#[test]
fn test_best_uses_default_count() {
    let (_dir, _clock, tracker) = setup();

    for id in ["a", "b", "c", "d", "e"] {
        tracker.record_success(id, 0);
    }
    assert_eq!(tracker.best().len(), 3);
}

#[test]
fn test_average_units() {
    let (_dir, _clock, tracker) = setup();

    tracker.record_success("m", 100);
    tracker.record_success("m", 201);
    tracker.record_error("m", 500, "");

    assert_eq!(tracker.resource("m").unwrap().average_units, 151);
}

#[test]
fn test_overview() {
    let (_dir, clock, tracker) = setup();

    tracker.record_success("a", 0);
    tracker.record_success("a", 0);
    tracker.record_error("b", 404, "missing");
    tracker.record_error("c", 429, "limited");

    let overview = tracker.overview();
    assert_eq!(overview.total_resources, 3);
    assert_eq!(overview.available_count, 1);
    assert_eq!(overview.total_requests, 4);
    assert_eq!(overview.successful_requests, 2);
    assert_eq!(overview.failed_requests, 2);
    assert!((overview.success_rate - 0.5).abs() < f64::EPSILON);
    assert_eq!(overview.last_reset, clock.start_of_day());
    assert_eq!(overview.next_reset, clock.next_midnight());
}

#[test]
fn test_daily_reset_clears_everything() {
    let (_dir, clock, tracker) = setup();

    tracker.record_success("a", 10);
    tracker.record_error("b", 404, "");

    clock.advance(Duration::days(1));

    let overview = tracker.overview();
    assert_eq!(overview.total_resources, 0);
    assert_eq!(overview.total_requests, 0);
    assert_eq!(overview.last_reset, clock.start_of_day());
    assert!(tracker.resource("b").is_none());
}

#[test]
fn test_same_day_keeps_ledger() {
    let (_dir, clock, tracker) = setup();

    tracker.record_success("a", 10);
    clock.advance(Duration::hours(14));

    assert_eq!(tracker.overview().total_requests, 1);
}

#[test]
fn test_reset() {
    let (_dir, _clock, tracker) = setup();

    tracker.record_success("a", 10);
    tracker.reset().unwrap();

    assert_eq!(tracker.overview().total_resources, 0);
}

#[test]
fn test_reads_legacy_format() {
    let (dir, clock, tracker) = setup();
    let start = clock.start_of_day().timestamp_millis();
    let error_at = clock.now().timestamp_millis() - 60_000;
    let legacy = format!(
        r#"{{
  "models": {{
    "meta-llama/llama-3.3-70b-instruct:free": {{
      "requests": 3,
      "successfulRequests": 2,
      "failedRequests": 1,
      "totalTokens": 900,
      "lastUsed": {start},
      "lastError": {{ "code": 429, "message": "Rate limit", "timestamp": {error_at} }},
      "errorCount": 1,
      "availability": "rate_limited"
    }},
    "google/gemma:free": {{
      "requests": 0,
      "successfulRequests": 0,
      "failedRequests": 0,
      "totalTokens": 0,
      "lastUsed": null,
      "lastError": null,
      "errorCount": 0,
      "availability": "unknown"
    }}
  }},
  "lastReset": {start},
  "totalRequests": 3
}}"#
    );
    std::fs::write(dir.path().join("availability.json"), legacy).unwrap();

    let stats = tracker
        .resource("meta-llama/llama-3.3-70b-instruct:free")
        .unwrap();
    assert_eq!(stats.total_units, 900);
    assert_eq!(stats.error_streak, 1);
    assert_eq!(stats.availability, Availability::RateLimited);
    assert_eq!(stats.average_units, 450);
    assert_eq!(stats.last_error.unwrap().timestamp.timestamp_millis(), error_at);

    // Rate limit is one minute old: only the unknown model is eligible
    assert_eq!(ids(&tracker.available()), vec!["google/gemma:free"]);
    assert_eq!(tracker.overview().total_requests, 3);
}

#[test]
fn test_persists_epoch_millis() {
    let (dir, clock, tracker) = setup();
    tracker.record_error("m", 429, "x");

    let raw: serde_json::Value = JsonStore::new(dir.path().join("availability.json"))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(
        raw["lastReset"].as_i64(),
        Some(clock.start_of_day().timestamp_millis())
    );
    assert_eq!(
        raw["models"]["m"]["lastError"]["timestamp"].as_i64(),
        Some(clock.now().timestamp_millis())
    );
    assert_eq!(raw["models"]["m"]["availability"], "rate_limited");
}

#[test]
fn test_ledger_round_trip() {
    let (dir, _clock, tracker) = setup();
    tracker.record_success("a", 5);
    tracker.record_error("b", 429, "limit");

    let store = JsonStore::new(dir.path().join("availability.json"));
    let ledger: AvailabilityLedger = store.load().unwrap().unwrap();
    store.save(&ledger).unwrap();
    assert_eq!(store.load::<AvailabilityLedger>().unwrap().unwrap(), ledger);
}

#[test]
fn test_governor_trait() {
    let (_dir, _clock, tracker) = setup();

    assert!(tracker.check_allowed().notice.is_none());

    Governor::record(
        &tracker,
        ResourceOutcome::Error {
            resource_id: "only".to_string(),
            code: 404,
            message: "gone".to_string(),
        },
    );

    let decision = tracker.check_allowed();
    assert!(decision.allowed);
    assert_eq!(decision.notice.unwrap().severity, Severity::Warning);

    Governor::record(
        &tracker,
        ResourceOutcome::Success {
            resource_id: "other".to_string(),
            units: 3,
        },
    );
    assert_eq!(Governor::stats(&tracker).available_count, 1);
}
