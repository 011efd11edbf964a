//! Cache module holding the menu for today
//!
//! This module provides an in-memory, single-slot cache that is refreshed by
//! background fetches and read synchronously. Stale values are kept when a
//! refresh fails, so callers always get the last known menu.

mod menu_cache;

pub use menu_cache::{
    select_menu_day, Clock, FetchOutcome, MenuCache, MenuStatus, UnavailableReason,
};
