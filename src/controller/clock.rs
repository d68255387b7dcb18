use std::time::Instant;

use chrono::{DateTime, Utc};

/// Where human-readable time comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallClock {
    /// Host clock.
    System,
    /// Last GPS time, advanced by the monotonic clock. Unknown until the
    /// first timed fix.
    Gps,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct ClockState {
    source: WallClock,
    gps_anchor: Option<(DateTime<Utc>, Instant)>,
}

impl ClockState {
    pub(super) fn new(source: WallClock) -> Self {
        Self {
            source,
            gps_anchor: None,
        }
    }

    pub(super) fn observe_fix(&mut self, utc: DateTime<Utc>, now: Instant) {
        self.gps_anchor = Some((utc, now));
    }

    pub(super) fn now_utc(&self, now: Instant) -> Option<DateTime<Utc>> {
        match self.source {
            WallClock::System => Some(Utc::now()),
            WallClock::Gps => {
                let (utc, at) = self.gps_anchor?;
                let elapsed = chrono::Duration::from_std(now.saturating_duration_since(at)).ok()?;
                Some(utc + elapsed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn gps_clock_extrapolates_from_last_fix() {
        let mut clock = ClockState::new(WallClock::Gps);
        let t0 = Instant::now();
        assert_eq!(clock.now_utc(t0), None);

        let utc = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        clock.observe_fix(utc, t0);
        assert_eq!(
            clock.now_utc(t0 + Duration::from_secs(90)),
            Some(utc + chrono::Duration::seconds(90))
        );
    }
}
