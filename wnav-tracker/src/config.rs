//! wnav-tracker specific configuration
//!
//! [`SessionSettings`] is the immutable snapshot a navigation session reads at
//! start. It is built from the TOML bootstrap configuration plus CLI
//! overrides and is never re-read while the session runs.

use crate::error::Result;
use crate::tracking::route::TravelMode;
use std::time::Duration;
use wnav_common::config::TomlConfig;
use wnav_common::events::RefreshKind;

/// Command-line overrides applied on top of the TOML file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub routing_base_url: Option<String>,
    pub mode: Option<TravelMode>,
    pub announcements_enabled: Option<bool>,
}

/// Refresh timer base intervals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshIntervals {
    pub traffic: Duration,
    pub weather: Duration,
    pub hazards: Duration,
    pub eta_polling: Duration,
}

impl RefreshIntervals {
    pub fn for_kind(&self, kind: RefreshKind) -> Duration {
        match kind {
            RefreshKind::Traffic => self.traffic,
            RefreshKind::Weather => self.weather,
            RefreshKind::Hazards => self.hazards,
            RefreshKind::EtaPolling => self.eta_polling,
        }
    }
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            traffic: Duration::from_millis(120_000),
            weather: Duration::from_millis(600_000),
            hazards: Duration::from_millis(180_000),
            eta_polling: Duration::from_millis(30_000),
        }
    }
}

/// Settings a navigation session runs with
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub announcements_enabled: bool,
    /// Sorted descending
    pub turn_thresholds_m: Vec<f64>,
    /// Sorted descending
    pub destination_thresholds_m: Vec<f64>,
    pub deviation_threshold_m: f64,
    pub reroute_debounce_ms: u64,
    pub position_history_len: usize,
    pub arrival_radius_m: f64,
    pub mode: TravelMode,
    pub refresh: RefreshIntervals,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            announcements_enabled: true,
            turn_thresholds_m: vec![500.0, 200.0, 100.0, 50.0],
            destination_thresholds_m: vec![10_000.0, 5_000.0, 2_000.0, 1_000.0, 500.0, 100.0],
            deviation_threshold_m: 50.0,
            reroute_debounce_ms: 5_000,
            position_history_len: 5,
            arrival_radius_m: 20.0,
            mode: TravelMode::Driving,
            refresh: RefreshIntervals::default(),
        }
    }
}

impl SessionSettings {
    /// Build settings from a validated TOML configuration
    ///
    /// # Errors
    ///
    /// [`crate::Error::Config`] if the configured travel mode is unknown.
    pub fn from_config(config: &TomlConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let mode = match overrides.mode {
            Some(mode) => mode,
            None => config.routing.mode.parse()?,
        };

        Ok(Self {
            announcements_enabled: overrides
                .announcements_enabled
                .unwrap_or(config.announcements.enabled),
            turn_thresholds_m: config.announcements.turn_thresholds_m.clone(),
            destination_thresholds_m: config.announcements.destination_thresholds_m.clone(),
            deviation_threshold_m: config.tracking.deviation_threshold_m,
            reroute_debounce_ms: config.tracking.reroute_debounce_ms,
            position_history_len: config.tracking.position_history_len,
            arrival_radius_m: config.tracking.arrival_radius_m,
            mode,
            refresh: RefreshIntervals {
                traffic: Duration::from_millis(config.refresh.traffic_interval_ms),
                weather: Duration::from_millis(config.refresh.weather_interval_ms),
                hazards: Duration::from_millis(config.refresh.hazards_interval_ms),
                eta_polling: Duration::from_millis(config.refresh.eta_interval_ms),
            },
        })
    }
}

/// Routing backend base URL after applying overrides
pub fn routing_base_url(config: &TomlConfig, overrides: &ConfigOverrides) -> String {
    overrides
        .routing_base_url
        .clone()
        .unwrap_or_else(|| config.routing.base_url.clone())
}
