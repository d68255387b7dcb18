use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Immutable snapshot of one decoded GPS solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub altitude_m: f64,
    #[serde(default)]
    pub speed_kmh: f64,
    #[serde(default = "default_valid")]
    pub valid: bool,
    /// UTC date and time reported by the receiver, when it has one.
    #[serde(default)]
    pub utc: Option<DateTime<Utc>>,
}

fn default_valid() -> bool {
    true
}

impl PositionFix {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}
