//! Routing configuration for the flex router.

use std::path::Path;

use chrono::Duration;
use serde::Deserialize;

/// Error loading a routing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config is not valid JSON for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config parsed but a value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration parameters for flex routing.
///
/// Deserialized from camelCase JSON; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingConfig {
    /// Maximum number of itineraries to return.
    pub max_itineraries: usize,

    /// Length of the range search window (minutes).
    /// Depart-at results departing later than the first requested
    /// departure plus this window are cut.
    pub search_window_mins: i64,

    /// Step between range-search iterations (seconds).
    pub iteration_departure_step_secs: i64,

    /// Number of threads evaluating range-search iterations.
    /// Zero runs the iterations sequentially on the calling thread.
    pub search_thread_pool_size: usize,

    /// Flex vehicle speed for straight-line path estimates (m/s).
    pub flex_speed_mps: f64,

    /// Fixed time added to straight-line path estimates (seconds).
    pub direct_extra_time_secs: i32,

    /// Maximum number of cached flex path answers.
    pub path_cache_capacity: u64,
}

impl RoutingConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_itineraries: usize,
        search_window_mins: i64,
        iteration_departure_step_secs: i64,
        search_thread_pool_size: usize,
        flex_speed_mps: f64,
        direct_extra_time_secs: i32,
        path_cache_capacity: u64,
    ) -> Self {
        Self {
            max_itineraries,
            search_window_mins,
            iteration_departure_step_secs,
            search_thread_pool_size,
            flex_speed_mps,
            direct_extra_time_secs,
            path_cache_capacity,
        }
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use flex_router::planner::RoutingConfig;
    ///
    /// let config = RoutingConfig::from_json_str(r#"{"maxItineraries": 5}"#).unwrap();
    /// assert_eq!(config.max_itineraries, 5);
    /// assert_eq!(config.search_window_mins, 40);
    ///
    /// assert!(RoutingConfig::from_json_str(r#"{"maxItineraries": 0}"#).is_err());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject values the router cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_itineraries == 0 {
            return Err(ConfigError::Invalid(
                "maxItineraries must be at least 1".to_string(),
            ));
        }
        if self.iteration_departure_step_secs <= 0 {
            return Err(ConfigError::Invalid(
                "iterationDepartureStepSecs must be positive".to_string(),
            ));
        }
        if self.search_window_mins < 0 {
            return Err(ConfigError::Invalid(
                "searchWindowMins must not be negative".to_string(),
            ));
        }
        if !(self.flex_speed_mps.is_finite() && self.flex_speed_mps > 0.0) {
            return Err(ConfigError::Invalid(
                "flexSpeedMps must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the search window as a Duration.
    pub fn search_window(&self) -> Duration {
        Duration::minutes(self.search_window_mins)
    }

    /// Returns the iteration step as a Duration.
    pub fn iteration_step(&self) -> Duration {
        Duration::seconds(self.iteration_departure_step_secs)
    }

    /// Number of range-search iterations covering the search window.
    pub fn iteration_count(&self) -> usize {
        let step = self.iteration_departure_step_secs.max(1);
        (self.search_window().num_seconds() / step) as usize + 1
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_itineraries: 20,
            search_window_mins: 40,
            iteration_departure_step_secs: 60,
            search_thread_pool_size: 0,
            flex_speed_mps: 8.0,
            direct_extra_time_secs: 300,
            path_cache_capacity: 10_000,
        }
    }
}
