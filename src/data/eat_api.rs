//! eat-api weekly menu client
//!
//! Fetches the meal plan of one canteen for one ISO week from the eat-api
//! static JSON endpoints and decodes it into a `MealPlan`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::{MealPlan, MenuWeek};

/// Base URL of the public eat-api deployment
pub const DEFAULT_BASE_URL: &str = "https://tum-dev.github.io/eat-api";

/// Request timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Sent with every request, e.g. "mensa-menu/0.1.0"
pub const USER_AGENT_VALUE: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when fetching a meal plan
#[derive(Debug, Error)]
pub enum MenuError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// Failed to parse JSON response
    #[error("Failed to parse meal plan: {0}")]
    Parse(#[from] serde_json::Error),

    /// Canteen key that cannot be used as a URL path segment
    #[error("Invalid canteen key '{0}'")]
    InvalidLocation(String),

    /// The fetch was dropped or panicked before it produced a result
    #[error("Menu fetch was interrupted before completing")]
    Interrupted,
}

/// Anything that can deliver a weekly meal plan for a canteen
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// Fetch the plan of `location` for `week`
    async fn fetch_week(&self, location: &str, week: MenuWeek) -> Result<MealPlan, MenuError>;
}

/// Client for the eat-api weekly menu endpoints
#[derive(Debug, Clone)]
pub struct EatApiClient {
    client: Client,
    base_url: String,
}

impl EatApiClient {
    /// Create a client for the public eat-api with default settings
    pub fn new() -> Result<Self, MenuError> {
        Self::with_options(
            DEFAULT_BASE_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            true,
        )
    }

    /// Create a client with a custom base URL, timeout and HTTPS policy
    ///
    /// With `https_only` set, plain `http://` URLs and redirects to them are
    /// refused.
    pub fn with_options(
        base_url: impl Into<String>,
        timeout: Duration,
        https_only: bool,
    ) -> Result<Self, MenuError> {
        let client = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .timeout(timeout)
            .https_only(https_only)
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a client around an already configured HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// URL of the weekly plan, e.g. `{base}/mensa-garching/2024/03.json`
    ///
    /// The canteen key is percent-encoded as a single path segment. Keys that
    /// are empty or made of dots only would still address another path and
    /// are rejected.
    pub fn week_url(&self, location: &str, week: MenuWeek) -> Result<String, MenuError> {
        if location.chars().all(|c| c == '.') {
            return Err(MenuError::InvalidLocation(location.to_string()));
        }

        Ok(format!(
            "{}/{}/{}/{:02}.json",
            self.base_url,
            urlencoding::encode(location),
            week.year,
            week.week
        ))
    }

    /// Fetch and decode the meal plan of `location` for `week`
    ///
    /// # Returns
    /// * `Ok(MealPlan)` - The decoded weekly plan
    /// * `Err(MenuError)` - If the request fails, the status is not a success
    ///   or the body is not a meal plan
    pub async fn fetch_meal_plan(
        &self,
        location: &str,
        week: MenuWeek,
    ) -> Result<MealPlan, MenuError> {
        let url = self.week_url(location, week)?;
        debug!(%url, "requesting meal plan");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MenuError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        let plan: MealPlan = serde_json::from_str(&text)?;
        debug!(days = plan.days.len(), "meal plan decoded");

        Ok(plan)
    }
}

#[async_trait]
impl MenuSource for EatApiClient {
    async fn fetch_week(&self, location: &str, week: MenuWeek) -> Result<MealPlan, MenuError> {
        self.fetch_meal_plan(location, week).await
    }
}
