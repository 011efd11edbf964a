//! Core data models for the mensa menu
//!
//! This module contains the types decoded from the eat-api weekly meal plans
//! and the static canteen catalog used to pick a location.

pub mod eat_api;
pub mod mensa;

pub use eat_api::{EatApiClient, MenuError, MenuSource};
pub use mensa::{all_mensas, get_mensa_by_id, nearest_mensa};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A canteen served by the eat-api
///
/// Uses `&'static str` fields so the catalog can be a static array. Only
/// `Serialize` is implemented; look canteens up again by id with
/// `get_mensa_by_id`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Mensa {
    /// Key used by the eat-api in its URLs (e.g. "mensa-garching")
    pub id: &'static str,
    /// Human-readable name of the canteen
    pub name: &'static str,
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
}

/// One price category for a dish
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// Fixed part of the price in euros
    #[serde(default)]
    pub base_price: Option<f64>,
    /// Variable part in euros per `unit`
    #[serde(default)]
    pub price_per_unit: Option<f64>,
    /// Unit for `price_per_unit`, e.g. "100g"
    #[serde(default)]
    pub unit: Option<String>,
}

impl Price {
    /// Formats the price for display, e.g. "2.50 €" or "1.00 € + 0.90 €/100g"
    ///
    /// Returns `None` when neither a base price nor a per-unit price is set.
    pub fn describe(&self) -> Option<String> {
        let base = self.base_price.filter(|p| *p > 0.0);
        let per_unit = match (self.price_per_unit.filter(|p| *p > 0.0), &self.unit) {
            (Some(p), Some(unit)) => Some(format!("{:.2} €/{}", p, unit)),
            (Some(p), None) => Some(format!("{:.2} €", p)),
            _ => None,
        };

        match (base, per_unit) {
            (Some(b), Some(u)) => Some(format!("{:.2} € + {}", b, u)),
            (Some(b), None) => Some(format!("{:.2} €", b)),
            (None, Some(u)) => Some(u),
            (None, None) => None,
        }
    }
}

/// Prices of a dish per customer group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    #[serde(default)]
    pub students: Option<Price>,
    #[serde(default)]
    pub staff: Option<Price>,
    #[serde(default)]
    pub guests: Option<Price>,
}

/// A single dish on a menu day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    /// Name of the dish
    pub name: String,
    /// Prices per customer group
    #[serde(default)]
    pub prices: Prices,
    /// Allergen and diet labels, e.g. "VEGAN", "GLUTEN"
    #[serde(default)]
    pub labels: Vec<String>,
    /// Category such as "Pasta" or "Wok"
    #[serde(default)]
    pub dish_type: String,
}

/// One calendar day's dish listing within a weekly plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuDay {
    /// Day the dishes are served (`yyyy-MM-dd` on the wire)
    pub date: NaiveDate,
    /// Dishes in provider order
    #[serde(default)]
    pub dishes: Vec<Dish>,
}

impl MenuDay {
    /// A day is only worth showing if something is served
    pub fn is_relevant(&self) -> bool {
        !self.dishes.is_empty()
    }
}

/// A weekly meal plan as returned by the eat-api
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    /// ISO week number echoed by the provider
    #[serde(default)]
    pub number: Option<u32>,
    /// ISO year echoed by the provider
    #[serde(default)]
    pub year: Option<i32>,
    /// Days of the week in provider order
    #[serde(default)]
    pub days: Vec<MenuDay>,
}

/// The (year, week) pair selecting a weekly plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuWeek {
    pub year: i32,
    pub week: u32,
}

impl MenuWeek {
    /// ISO-8601 week containing `date`
    ///
    /// The year is the ISO week-based year, which differs from the calendar
    /// year for the first and last few days of some years.
    pub fn containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}
