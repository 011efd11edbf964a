//! Single-slot cache for today's menu
//!
//! `MenuCache` keeps at most one `MenuDay`. Reads are synchronous snapshots;
//! every `get_menu` call fires a fetch of the current week's plan in the
//! background and the slot is overwritten when (and if) that fetch yields a
//! relevant day. The last completion wins; nothing is deduplicated or
//! cancelled.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Local, NaiveDate};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::data::{MealPlan, MenuDay, MenuError, MenuSource, MenuWeek};

/// Source of "today" for week selection and day filtering
pub type Clock = fn() -> NaiveDate;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Picks the first day in list order that has dishes and is today or later
///
/// The provider lists days chronologically, but that is not checked here:
/// list order decides.
pub fn select_menu_day(plan: &MealPlan, today: NaiveDate) -> Option<&MenuDay> {
    plan.days
        .iter()
        // "today or on/after today" is kept as the provider contract states it
        .find(|day| day.is_relevant() && (day.date == today || day.date >= today))
}

/// Result of one completed fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// A relevant day was found and stored
    Updated(MenuDay),
    /// The plan decoded but had no relevant day; the slot was left alone
    NoMatchingDay,
    /// Network, status or decode failure; the slot was left alone
    Failed(Arc<MenuError>),
}

impl FetchOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, FetchOutcome::Updated(_))
    }
}

/// Why no menu can be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The week has no day with dishes from today on
    NoMatchingDay,
    /// The last fetch failed with this message
    FetchFailed(String),
}

/// Three-state view of the cache
#[derive(Debug, Clone, PartialEq)]
pub enum MenuStatus {
    /// Nothing cached yet and a fetch is outstanding (or none has finished)
    Pending,
    /// A menu day is cached
    Resolved(MenuDay),
    /// Nothing cached and the last fetch could not provide a day
    Unavailable(UnavailableReason),
}

#[derive(Debug, Default)]
struct Slot {
    menu: Option<MenuDay>,
    in_flight: usize,
    completed: u64,
    last_outcome: Option<FetchOutcome>,
}

impl Slot {
    fn record(&mut self, outcome: FetchOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.completed += 1;
        self.last_outcome = Some(outcome);
    }
}

/// One fetch counted in `Slot::in_flight`
///
/// Settled by `MenuCache::apply`. If the fetch future is dropped first
/// (timeout, `select!`, runtime shutdown) or the source panics, `Drop`
/// takes the fetch out of the count and records it as interrupted.
struct InFlight {
    slot: Arc<RwLock<Slot>>,
    settled: bool,
}

impl InFlight {
    fn settle(mut self, slot: &mut Slot, outcome: FetchOutcome) {
        self.settled = true;
        slot.record(outcome);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!("menu fetch dropped before completing");
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .record(FetchOutcome::Failed(Arc::new(MenuError::Interrupted)));
    }
}

/// Best-effort cache of the menu for today or the next serving day
///
/// Cloning is cheap and clones share the same slot. `get_menu` and
/// `spawn_refresh` spawn tokio tasks and must run inside a runtime.
#[derive(Clone)]
pub struct MenuCache {
    source: Arc<dyn MenuSource>,
    slot: Arc<RwLock<Slot>>,
    updates: Arc<watch::Sender<Option<MenuDay>>>,
    clock: Clock,
}

impl MenuCache {
    /// Creates an empty cache backed by `source`
    pub fn new(source: impl MenuSource + 'static) -> Self {
        Self::with_source(Arc::new(source))
    }

    /// Creates an empty cache backed by a shared source
    pub fn with_source(source: Arc<dyn MenuSource>) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            source,
            slot: Arc::new(RwLock::new(Slot::default())),
            updates: Arc::new(updates),
            clock: local_today,
        }
    }

    /// Replaces the clock used to determine "today"
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, Slot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Slot> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached menu and starts a background refresh
    ///
    /// The returned value is whatever was cached when the call was made:
    /// `None` before the first successful fetch, possibly stale afterwards.
    /// Failures of the refresh are not reported here; see `status` and
    /// `last_outcome`.
    pub fn get_menu(&self, location_key: &str) -> Option<MenuDay> {
        let snapshot = self.cached();
        // Fire and forget; the task writes the slot on completion
        drop(self.spawn_refresh(location_key));
        snapshot
    }

    /// The cached menu, without fetching
    pub fn cached(&self) -> Option<MenuDay> {
        self.read_slot().menu.clone()
    }

    /// Outcome of the most recently completed fetch
    pub fn last_outcome(&self) -> Option<FetchOutcome> {
        self.read_slot().last_outcome.clone()
    }

    /// Number of fetches started but not yet completed
    pub fn in_flight(&self) -> usize {
        self.read_slot().in_flight
    }

    /// Number of fetches that have completed, interrupted ones included
    pub fn completed(&self) -> u64 {
        self.read_slot().completed
    }

    /// Distinguishes "still loading" from "nothing to show"
    pub fn status(&self) -> MenuStatus {
        let slot = self.read_slot();

        if let Some(menu) = &slot.menu {
            return MenuStatus::Resolved(menu.clone());
        }
        if slot.in_flight > 0 {
            return MenuStatus::Pending;
        }

        match &slot.last_outcome {
            None => MenuStatus::Pending,
            Some(FetchOutcome::Updated(day)) => MenuStatus::Resolved(day.clone()),
            Some(FetchOutcome::NoMatchingDay) => {
                MenuStatus::Unavailable(UnavailableReason::NoMatchingDay)
            }
            Some(FetchOutcome::Failed(err)) => {
                MenuStatus::Unavailable(UnavailableReason::FetchFailed(err.to_string()))
            }
        }
    }

    /// Receiver notified each time a fetch stores a new menu
    pub fn subscribe(&self) -> watch::Receiver<Option<MenuDay>> {
        self.updates.subscribe()
    }

    /// Fetches the current week for `location_key` and applies the result
    ///
    /// Dropping the returned future before it finishes records the fetch as
    /// `MenuError::Interrupted`.
    pub async fn refresh(&self, location_key: &str) -> FetchOutcome {
        let fetch = self.begin_fetch();
        self.complete_fetch(location_key, fetch).await
    }

    /// Spawns `refresh` as a task and returns its handle
    ///
    /// The fetch is counted as in flight before this returns.
    pub fn spawn_refresh(&self, location_key: &str) -> JoinHandle<FetchOutcome> {
        let fetch = self.begin_fetch();

        let cache = self.clone();
        let location = location_key.to_string();
        tokio::spawn(async move { cache.complete_fetch(&location, fetch).await })
    }

    fn begin_fetch(&self) -> InFlight {
        self.write_slot().in_flight += 1;
        InFlight {
            slot: Arc::clone(&self.slot),
            settled: false,
        }
    }

    async fn complete_fetch(&self, location: &str, fetch: InFlight) -> FetchOutcome {
        let week = MenuWeek::containing((self.clock)());
        debug!(location, year = week.year, week = week.week, "fetching menu");

        let outcome = match self.source.fetch_week(location, week).await {
            // Day filtering uses the date at completion, not at issue
            Ok(plan) => match select_menu_day(&plan, (self.clock)()) {
                Some(day) => FetchOutcome::Updated(day.clone()),
                None => FetchOutcome::NoMatchingDay,
            },
            Err(err) => FetchOutcome::Failed(Arc::new(err)),
        };

        self.apply(location, fetch, &outcome);
        outcome
    }

    fn apply(&self, location: &str, fetch: InFlight, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Updated(day) => {
                info!(location, date = %day.date, dishes = day.dishes.len(), "menu cache updated");
            }
            FetchOutcome::NoMatchingDay => {
                debug!(location, "no serving day left this week, keeping cached menu");
            }
            FetchOutcome::Failed(err) => {
                warn!(location, error = %err, "menu fetch failed, keeping cached menu");
            }
        }

        // Subscribers are notified under the same write lock, so they end on
        // the value `cached` returns
        let mut slot = self.write_slot();
        if let FetchOutcome::Updated(day) = outcome {
            slot.menu = Some(day.clone());
            self.updates.send_replace(Some(day.clone()));
        }
        fetch.settle(&mut slot, outcome.clone());
    }
}
