use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::position::PositionFix;

/// Everything the state machines may look at during one control cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext<'a> {
    pub now: Instant,
    /// Best known UTC time, used for file names and point timestamps only.
    pub wall_clock: Option<DateTime<Utc>>,
    /// Valid fix delivered this cycle, if any.
    pub fix: Option<&'a PositionFix>,
    /// Distance from home of the most recent valid fix.
    pub distance_km: Option<f64>,
    pub auto_tracking: bool,
}
