//! Integration tests for the menu cache
//!
//! Drives `MenuCache` through in-process menu sources whose responses are
//! released by the test, so completion order is under test control.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tokio::sync::oneshot;

use mensa_menu::cache::{FetchOutcome, MenuCache, MenuStatus, UnavailableReason};
use mensa_menu::data::{Dish, MealPlan, MenuDay, MenuError, MenuSource, MenuWeek};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 17).unwrap()
}

fn day(offset: i64, dishes: &[&str]) -> MenuDay {
    MenuDay {
        date: today() + Duration::days(offset),
        dishes: dishes
            .iter()
            .map(|name| Dish {
                name: name.to_string(),
                prices: Default::default(),
                labels: vec![],
                dish_type: String::new(),
            })
            .collect(),
    }
}

fn plan(days: Vec<MenuDay>) -> MealPlan {
    MealPlan {
        days,
        ..Default::default()
    }
}

type Response = Result<MealPlan, MenuError>;

/// One response channel per fetch, indexed by call order
#[derive(Default)]
struct Responses {
    senders: Vec<Option<oneshot::Sender<Response>>>,
    receivers: Vec<Option<oneshot::Receiver<Response>>>,
}

impl Responses {
    fn reserve(&mut self, index: usize) {
        while self.senders.len() <= index {
            let (tx, rx) = oneshot::channel();
            self.senders.push(Some(tx));
            self.receivers.push(Some(rx));
        }
    }
}

/// Each fetch waits until the test releases the response for its call number
struct GatedSource {
    responses: Arc<Mutex<Responses>>,
    calls: Arc<AtomicUsize>,
    weeks: Arc<Mutex<Vec<(String, MenuWeek)>>>,
}

struct Gate {
    responses: Arc<Mutex<Responses>>,
    released: AtomicUsize,
    calls: Arc<AtomicUsize>,
    weeks: Arc<Mutex<Vec<(String, MenuWeek)>>>,
}

impl Gate {
    /// Answers the oldest call not released yet
    fn release(&self, response: Response) {
        let index = self.released.fetch_add(1, Ordering::SeqCst);
        self.release_call(index, response);
    }

    /// Answers call number `index` (0-based, in the order fetches started)
    fn release_call(&self, index: usize, response: Response) {
        let mut responses = self.responses.lock().unwrap();
        responses.reserve(index);
        let tx = responses.senders[index].take().expect("call already released");
        // The fetch may have been dropped already
        let _ = tx.send(response);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn wait_for_calls(&self, count: usize) {
        while self.calls() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl MenuSource for GatedSource {
    async fn fetch_week(&self, location: &str, week: MenuWeek) -> Result<MealPlan, MenuError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.weeks.lock().unwrap().push((location.to_string(), week));

        let rx = {
            let mut responses = self.responses.lock().unwrap();
            responses.reserve(index);
            responses.receivers[index].take()
        };
        match rx {
            Some(rx) => rx.await.unwrap_or_else(|_| Ok(MealPlan::default())),
            None => Ok(MealPlan::default()),
        }
    }
}

fn gated_cache() -> (MenuCache, Gate) {
    let responses = Arc::new(Mutex::new(Responses::default()));
    let calls = Arc::new(AtomicUsize::new(0));
    let weeks = Arc::new(Mutex::new(Vec::new()));
    let source = GatedSource {
        responses: responses.clone(),
        calls: calls.clone(),
        weeks: weeks.clone(),
    };
    let cache = MenuCache::new(source).with_clock(today);
    let gate = Gate {
        responses,
        released: AtomicUsize::new(0),
        calls,
        weeks,
    };
    (cache, gate)
}

fn unavailable() -> MenuError {
    MenuError::Status {
        status: 503,
        url: "http://test/mensa-garching/2024/29.json".to_string(),
    }
}

#[tokio::test]
async fn test_first_call_returns_none_while_fetch_is_pending() {
    let (cache, gate) = gated_cache();

    assert!(cache.get_menu("mensa-garching").is_none());
    assert_eq!(cache.status(), MenuStatus::Pending);
    assert_eq!(cache.in_flight(), 1);

    gate.release(Ok(plan(vec![day(0, &["A"])])));
}

#[tokio::test]
async fn test_fetch_requests_current_iso_week_for_location() {
    let (cache, gate) = gated_cache();

    let handle = cache.spawn_refresh("mensa-pasing");
    gate.release(Ok(plan(vec![])));
    handle.await.unwrap();

    let weeks = gate.weeks.lock().unwrap();
    assert_eq!(
        weeks.as_slice(),
        &[("mensa-pasing".to_string(), MenuWeek { year: 2024, week: 29 })]
    );
}

#[tokio::test]
async fn test_all_empty_days_never_update_the_cache() {
    let (cache, gate) = gated_cache();

    let first = cache.spawn_refresh("mensa-garching");
    gate.release(Ok(plan(vec![day(0, &["A"])])));
    first.await.unwrap();

    let second = cache.spawn_refresh("mensa-garching");
    gate.release(Ok(plan(vec![day(0, &[]), day(1, &[]), day(2, &[])])));
    let outcome = second.await.unwrap();

    assert!(matches!(outcome, FetchOutcome::NoMatchingDay));
    assert_eq!(cache.cached(), Some(day(0, &["A"])));
}

#[tokio::test]
async fn test_earliest_relevant_day_in_list_order_is_cached() {
    let (cache, gate) = gated_cache();

    let handle = cache.spawn_refresh("mensa-garching");
    gate.release(Ok(plan(vec![
        day(-2, &["Old"]),
        day(0, &[]),
        day(2, &["Thursday"]),
        day(1, &["Tomorrow"]),
    ])));
    handle.await.unwrap();

    assert_eq!(cache.cached(), Some(day(2, &["Thursday"])));
}

#[tokio::test]
async fn test_yesterday_empty_today_tomorrow_scenario() {
    let (cache, gate) = gated_cache();

    let handle = cache.spawn_refresh("mensa-garching");
    gate.release(Ok(plan(vec![day(-1, &["A"]), day(0, &[]), day(1, &["B"])])));
    handle.await.unwrap();

    assert_eq!(cache.cached(), Some(day(1, &["B"])));
}

#[tokio::test]
async fn test_empty_week_leaves_cache_unset() {
    let (cache, gate) = gated_cache();

    let handle = cache.spawn_refresh("mensa-garching");
    gate.release(Ok(plan(vec![])));
    handle.await.unwrap();

    assert!(cache.cached().is_none());
    assert_eq!(
        cache.status(),
        MenuStatus::Unavailable(UnavailableReason::NoMatchingDay)
    );
}

#[tokio::test]
async fn test_repeated_reads_are_stable_until_a_completion_lands() {
    let (cache, gate) = gated_cache();

    let handle = cache.spawn_refresh("mensa-garching");
    gate.release(Ok(plan(vec![day(0, &["A"])])));
    handle.await.unwrap();

    // Three more fetches are now outstanding and never released
    let reads: Vec<_> = (0..3).map(|_| cache.get_menu("mensa-garching")).collect();

    assert!(reads.iter().all(|r| *r == Some(day(0, &["A"]))));
    assert_eq!(cache.in_flight(), 3);
    assert_eq!(cache.status(), MenuStatus::Resolved(day(0, &["A"])));
}

#[tokio::test]
async fn test_every_call_issues_its_own_request() {
    let (cache, gate) = gated_cache();

    let handles: Vec<_> = (0..3)
        .map(|_| cache.spawn_refresh("mensa-garching"))
        .collect();
    for _ in 0..3 {
        gate.release(Ok(plan(vec![])));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(gate.calls(), 3);
    assert_eq!(cache.in_flight(), 0);
}

#[tokio::test]
async fn test_later_completion_replaces_earlier_day() {
    let (cache, gate) = gated_cache();
    let mut updates = cache.subscribe();

    let first = cache.spawn_refresh("mensa-garching");
    let second = cache.spawn_refresh("mensa-garching");

    gate.release(Ok(plan(vec![day(0, &["Early"])])));
    updates.changed().await.unwrap();
    assert_eq!(cache.cached(), Some(day(0, &["Early"])));

    gate.release(Ok(plan(vec![day(1, &["Late"])])));
    first.await.unwrap();
    second.await.unwrap();

    // No date comparison: the later completion replaces an earlier day
    assert_eq!(cache.cached(), Some(day(1, &["Late"])));
}

#[tokio::test]
async fn test_last_completion_wins_over_issue_order() {
    let (cache, gate) = gated_cache();
    let updates = cache.subscribe();

    let first = cache.spawn_refresh("mensa-garching");
    gate.wait_for_calls(1).await;
    let second = cache.spawn_refresh("mensa-garching");
    gate.wait_for_calls(2).await;

    // The second request answers first
    gate.release_call(1, Ok(plan(vec![day(1, &["Second"])])));
    second.await.unwrap();
    assert_eq!(cache.cached(), Some(day(1, &["Second"])));

    // The first request finishes last and wins, although issued earlier
    gate.release_call(0, Ok(plan(vec![day(0, &["First"])])));
    first.await.unwrap();

    assert_eq!(cache.cached(), Some(day(0, &["First"])));
    assert_eq!(*updates.borrow(), Some(day(0, &["First"])));
    assert_eq!(cache.in_flight(), 0);
}

#[tokio::test]
async fn test_failure_after_success_keeps_stale_value() {
    let (cache, gate) = gated_cache();

    let handle = cache.spawn_refresh("mensa-garching");
    gate.release(Ok(plan(vec![day(0, &["A"])])));
    handle.await.unwrap();

    let handle = cache.spawn_refresh("mensa-garching");
    gate.release(Err(unavailable()));
    let outcome = handle.await.unwrap();

    assert!(matches!(outcome, FetchOutcome::Failed(_)));
    assert!(matches!(cache.last_outcome(), Some(FetchOutcome::Failed(_))));
    assert_eq!(cache.status(), MenuStatus::Resolved(day(0, &["A"])));
    assert_eq!(cache.get_menu("mensa-garching"), Some(day(0, &["A"])));
}

#[tokio::test]
async fn test_failure_without_value_is_unavailable() {
    let (cache, gate) = gated_cache();

    let handle = cache.spawn_refresh("mensa-garching");
    gate.release(Err(unavailable()));
    handle.await.unwrap();

    match cache.status() {
        MenuStatus::Unavailable(UnavailableReason::FetchFailed(msg)) => {
            assert!(msg.contains("503"), "unexpected message {}", msg)
        }
        other => panic!("Expected unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_status_stays_pending_while_another_fetch_runs() {
    let (cache, gate) = gated_cache();

    let _first = cache.spawn_refresh("mensa-garching");
    let _second = cache.spawn_refresh("mensa-garching");

    gate.release(Err(unavailable()));
    while cache.last_outcome().is_none() {
        tokio::task::yield_now().await;
    }

    // One fetch is still outstanding, so nothing is final yet
    assert_eq!(cache.in_flight(), 1);
    assert_eq!(cache.status(), MenuStatus::Pending);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reads_from_other_threads_see_completed_writes() {
    let (cache, gate) = gated_cache();

    let handle = cache.spawn_refresh("mensa-garching");
    gate.release(Ok(plan(vec![day(0, &["A"])])));
    handle.await.unwrap();

    let reader = cache.clone();
    let seen = std::thread::spawn(move || reader.cached())
        .join()
        .unwrap();

    assert_eq!(seen, Some(day(0, &["A"])));
}
