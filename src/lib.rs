//! Mensa menu library
//!
//! Exposes the menu cache, the eat-api client and the terminal widget pieces
//! used by the `mensa` binary and the integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod refresh;
pub mod ui;
