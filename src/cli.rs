//! Command-line interface parsing for the mensa menu
//!
//! This module handles parsing of CLI arguments using clap, including
//! `--near` for picking the closest canteen from a coordinate pair.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::Config;
use crate::data::nearest_mensa;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The `--near` value is not a valid coordinate pair
    #[error("Invalid coordinates: '{0}'. Expected LAT,LON such as 48.26,11.67")]
    InvalidCoordinates(String),
}

/// mensa - today's canteen menu from the eat-api
#[derive(Parser, Debug)]
#[command(name = "mensa")]
#[command(about = "Today's canteen menu from the eat-api weekly plans")]
#[command(version)]
pub struct Cli {
    /// eat-api canteen key, e.g. mensa-garching (see --list)
    #[arg(short, long, value_name = "KEY")]
    pub location: Option<String>,

    /// Use the known canteen nearest to these coordinates
    ///
    /// Examples:
    ///   mensa --near 48.265,11.671     # Garching campus
    ///   mensa --near=-33.86,151.21     # negative values need '='
    #[arg(long, value_name = "LAT,LON", conflicts_with = "location")]
    pub near: Option<String>,

    /// Override the eat-api base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Allow plain http:// API URLs, e.g. a local eat-api mirror
    #[arg(long)]
    pub allow_http: bool,

    /// Read settings from this JSON file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the menu as JSON
    #[arg(long, conflicts_with_all = ["tui", "list"])]
    pub json: bool,

    /// Open the live terminal widget
    #[arg(long, conflicts_with = "list")]
    pub tui: bool,

    /// List known canteens and exit
    #[arg(long)]
    pub list: bool,
}

/// What the binary should do after startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Fetch once and print plain text
    #[default]
    Text,
    /// Fetch once and print JSON
    Json,
    /// Run the terminal widget
    Tui,
    /// Print the canteen catalog
    List,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    /// Selected output mode
    pub mode: OutputMode,
    /// Canteen key chosen by `--location` or `--near`
    pub location: Option<String>,
    /// Base URL from `--api-url`
    pub api_url: Option<String>,
    /// `--allow-http` was given
    pub allow_http: bool,
}

/// Parses a "LAT,LON" pair and checks the value ranges
pub fn parse_coordinates(s: &str) -> Result<(f64, f64), CliError> {
    let invalid = || CliError::InvalidCoordinates(s.to_string());

    let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(invalid());
    }

    Ok((lat, lon))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the selected mode and overrides
    /// * `Err(CliError)` if `--near` is not a valid coordinate pair
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mode = if cli.list {
            OutputMode::List
        } else if cli.tui {
            OutputMode::Tui
        } else if cli.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let location = match (&cli.location, &cli.near) {
            (Some(location), _) => Some(location.clone()),
            (None, Some(near)) => {
                let (lat, lon) = parse_coordinates(near)?;
                let mensa =
                    nearest_mensa(lat, lon).ok_or_else(|| CliError::InvalidCoordinates(near.clone()))?;
                Some(mensa.id.to_string())
            }
            (None, None) => None,
        };

        Ok(StartupConfig {
            mode,
            location,
            api_url: cli.api_url.clone(),
            allow_http: cli.allow_http,
        })
    }

    /// Applies the command-line overrides on top of a loaded config
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(location) = &self.location {
            config.location = location.clone();
        }
        if let Some(api_url) = &self.api_url {
            config.base_url = api_url.clone();
        }
        if self.allow_http {
            config.https_only = false;
        }
        config
    }
}
