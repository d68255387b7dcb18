use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::connectivity::ConnectivityPolicy;
use crate::track::TrackingPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geofence: GeofenceConfig,
    pub tracking: TrackingConfig,
    pub connectivity: ConnectivityConfig,
    pub store: StoreConfig,
    pub web: WebConfig,
    pub control: ControlConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeofenceConfig {
    pub radius_km: f64,
    /// Overrides the radius for network role decisions only.
    pub connectivity_radius_km: Option<f64>,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            radius_km: 0.1,
            connectivity_radius_km: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub tracks_dir: PathBuf,
    #[serde(deserialize_with = "human_duration")]
    pub min_interval: Duration,
    pub min_displacement_m: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tracks_dir: PathBuf::from("tracks"),
            min_interval: Duration::from_secs(1),
            min_displacement_m: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    #[serde(deserialize_with = "human_duration")]
    pub dwell: Duration,
    #[serde(deserialize_with = "human_duration")]
    pub connect_timeout: Duration,
    pub max_failures: u8,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            dwell: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            max_failures: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("settings.yaml"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    #[serde(deserialize_with = "human_duration")]
    pub cycle_interval: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub client_reachable: bool,
    #[serde(deserialize_with = "human_duration")]
    pub connect_delay: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            client_reachable: true,
            connect_delay: Duration::from_secs(2),
        }
    }
}

fn human_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.into()));
        if self.geofence.radius_km <= 0.0 {
            return invalid("geofence.radius_km must be positive");
        }
        if self.geofence.connectivity_radius_km.is_some_and(|r| r <= 0.0) {
            return invalid("geofence.connectivity_radius_km must be positive");
        }
        if self.tracking.min_displacement_m < 0.0 {
            return invalid("tracking.min_displacement_m must not be negative");
        }
        if self.connectivity.max_failures == 0 {
            return invalid("connectivity.max_failures must be at least 1");
        }
        if self.control.cycle_interval.is_zero() {
            return invalid("control.cycle_interval must be non-zero");
        }
        Ok(())
    }

    pub fn tracking_policy(&self) -> TrackingPolicy {
        TrackingPolicy {
            radius_km: self.geofence.radius_km,
            min_interval: self.tracking.min_interval,
            min_displacement_m: self.tracking.min_displacement_m,
        }
    }

    pub fn connectivity_policy(&self) -> ConnectivityPolicy {
        ConnectivityPolicy {
            radius_km: self
                .geofence
                .connectivity_radius_km
                .unwrap_or(self.geofence.radius_km),
            dwell: self.connectivity.dwell,
            connect_timeout: self.connectivity.connect_timeout,
            max_failures: self.connectivity.max_failures,
        }
    }
}
