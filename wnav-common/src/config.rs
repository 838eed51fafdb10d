//! Configuration loading and config file resolution
//!
//! Configuration is a single TOML file. Every key has a built-in default, so
//! a missing file or a partial file still yields a complete configuration.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`WNAV_CONFIG`)
//! 3. User config directory (`~/.config/wnav/config.toml` on Linux)
//! 4. System config (`/etc/wnav/config.toml`, Linux only)
//! 5. Compiled defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "WNAV_CONFIG";

/// Complete TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub routing: RoutingConfig,
    pub announcements: AnnouncementConfig,
    pub tracking: TrackingConfig,
    pub refresh: RefreshConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Routing backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Base URL of the routing API
    pub base_url: String,
    /// Travel mode sent with every route request (driving, walking, cycling)
    pub mode: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5800".to_string(),
            mode: "driving".to_string(),
            timeout_ms: 15_000,
        }
    }
}

/// Announcement thresholds and switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementConfig {
    /// Master switch for voice announcements
    pub enabled: bool,
    /// Distance-to-turn thresholds in meters
    pub turn_thresholds_m: Vec<f64>,
    /// Remaining-distance thresholds in meters
    pub destination_thresholds_m: Vec<f64>,
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            turn_thresholds_m: vec![500.0, 200.0, 100.0, 50.0],
            destination_thresholds_m: vec![10_000.0, 5_000.0, 2_000.0, 1_000.0, 500.0, 100.0],
        }
    }
}

/// Route tracking parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Distance from the nearest route vertex that counts as off-route
    pub deviation_threshold_m: f64,
    /// Minimum gap between two reroute triggers
    pub reroute_debounce_ms: u64,
    /// Number of recent fixes kept for rolling speed estimation
    pub position_history_len: usize,
    /// Remaining distance at which the destination counts as reached
    pub arrival_radius_m: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            deviation_threshold_m: 50.0,
            reroute_debounce_ms: 5_000,
            position_history_len: 5,
            arrival_radius_m: 20.0,
        }
    }
}

/// Base intervals of the periodic refresh timers
///
/// These are scaled up at runtime when the battery runs low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub traffic_interval_ms: u64,
    pub weather_interval_ms: u64,
    pub hazards_interval_ms: u64,
    pub eta_interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            traffic_interval_ms: 120_000,
            weather_interval_ms: 600_000,
            hazards_interval_ms: 180_000,
            eta_interval_ms: 30_000,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    ///
    /// Threshold lists are sorted descending after validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: TomlConfig = toml::from_str(content)?;
        config.normalize()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the config file location and load it
    ///
    /// A missing file is not an error: a warning is logged and defaults are
    /// returned. A file that exists but fails to parse or validate is an error.
    pub fn resolve_and_load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration");
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    path = %path.display(),
                    "Config file not found, using built-in defaults"
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validate values and sort threshold lists descending
    pub fn normalize(&mut self) -> Result<()> {
        validate_thresholds("announcements.turn_thresholds_m", &self.announcements.turn_thresholds_m)?;
        validate_thresholds(
            "announcements.destination_thresholds_m",
            &self.announcements.destination_thresholds_m,
        )?;

        if !(self.tracking.deviation_threshold_m.is_finite() && self.tracking.deviation_threshold_m > 0.0) {
            return Err(Error::Config(
                "tracking.deviation_threshold_m must be a positive number".to_string(),
            ));
        }
        if self.tracking.reroute_debounce_ms == 0 {
            return Err(Error::Config(
                "tracking.reroute_debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.tracking.position_history_len == 0 {
            return Err(Error::Config(
                "tracking.position_history_len must be at least 1".to_string(),
            ));
        }
        if self.routing.base_url.trim().is_empty() {
            return Err(Error::Config("routing.base_url must not be empty".to_string()));
        }

        let descending = |a: &f64, b: &f64| b.total_cmp(a);
        self.announcements.turn_thresholds_m.sort_by(descending);
        self.announcements.destination_thresholds_m.sort_by(descending);
        self.announcements.turn_thresholds_m.dedup();
        self.announcements.destination_thresholds_m.dedup();

        Ok(())
    }
}

fn validate_thresholds(key: &str, values: &[f64]) -> Result<()> {
    if let Some(bad) = values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(Error::Config(format!(
            "{} contains invalid threshold {}",
            key, bad
        )));
    }
    Ok(())
}

/// Resolve the config file path following the documented priority order
///
/// Returns `None` when no candidate location applies (no CLI argument, no
/// environment variable and no file in the default locations).
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3/4: Platform config locations
    default_config_paths().into_iter().find(|p| p.exists())
}

/// Platform default config file candidates, most specific first
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("wnav").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        paths.push(PathBuf::from("/etc/wnav/config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.tracking.reroute_debounce_ms, 5_000);
        assert_eq!(config.announcements.turn_thresholds_m, vec![500.0, 200.0, 100.0, 50.0]);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [tracking]
            deviation_threshold_m = 75.0
            "#,
        )
        .unwrap();
        assert_eq!(config.tracking.deviation_threshold_m, 75.0);
        assert_eq!(config.tracking.reroute_debounce_ms, 5_000);
        assert_eq!(config.routing.mode, "driving");
    }

    #[test]
    fn test_thresholds_sorted_descending() {
        let config = TomlConfig::from_toml_str(
            r#"
            [announcements]
            turn_thresholds_m = [50, 500, 100, 200, 100]
            "#,
        )
        .unwrap();
        assert_eq!(config.announcements.turn_thresholds_m, vec![500.0, 200.0, 100.0, 50.0]);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = TomlConfig::from_toml_str(
            r#"
            [announcements]
            destination_thresholds_m = [1000, -5]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let err = TomlConfig::from_toml_str(
            r#"
            [tracking]
            reroute_debounce_ms = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = TomlConfig::from_toml_str("[tracking\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
