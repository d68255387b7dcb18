use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration, Instant};

use super::parsing::parse_fix_lines;
use super::{FixSource, FixSourceError, PositionFix};

const FALLBACK_SPACING: Duration = Duration::from_secs(1);

/// Replays a recorded fix log, releasing each fix once its recorded offset
/// from the first fix has elapsed.
pub struct ReplaySource {
    pending: VecDeque<(Duration, PositionFix)>,
    started: Option<Instant>,
}

impl ReplaySource {
    pub fn from_file(path: &Path) -> Result<Self, FixSourceError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(parse_fix_lines(&content)?))
    }

    pub fn new(fixes: Vec<PositionFix>) -> Self {
        Self {
            pending: schedule(fixes).into(),
            started: None,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Drains the log with the offsets at which each fix would be delivered.
    #[cfg(test)]
    pub fn into_schedule(self) -> Vec<(Duration, PositionFix)> {
        self.pending.into()
    }
}

impl FixSource for ReplaySource {
    fn poll(&mut self, now: Instant) -> Option<PositionFix> {
        let started = *self.started.get_or_insert(now);
        let (offset, _) = self.pending.front()?;
        if now.saturating_duration_since(started) < *offset {
            return None;
        }
        self.pending.pop_front().map(|(_, fix)| fix)
    }

    fn exhausted(&self) -> bool {
        self.pending.is_empty()
    }
}

fn schedule(fixes: Vec<PositionFix>) -> Vec<(Duration, PositionFix)> {
    let first_utc = fixes.iter().find_map(|f| f.utc);
    let mut last = Duration::ZERO;
    fixes
        .into_iter()
        .enumerate()
        .map(|(i, fix)| {
            let offset = match (first_utc, fix.utc) {
                (Some(first), Some(at)) => (at - first).to_std().unwrap_or(last),
                _ if i == 0 => Duration::ZERO,
                _ => last + FALLBACK_SPACING,
            };
            // Out-of-order timestamps never rewind the replay clock.
            last = offset.max(last);
            (last, fix)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(lat: f64, secs: Option<u32>) -> PositionFix {
        PositionFix {
            lat,
            lon: 0.0,
            altitude_m: 0.0,
            speed_kmh: 0.0,
            valid: true,
            utc: secs.map(|s| Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, s).unwrap()),
        }
    }

    #[test]
    fn releases_fixes_at_recorded_offsets() {
        let mut source = ReplaySource::new(vec![fix(1.0, Some(0)), fix(2.0, Some(3))]);
        let t0 = Instant::now();

        assert_eq!(source.poll(t0).map(|f| f.lat), Some(1.0));
        assert!(source.poll(t0 + Duration::from_secs(2)).is_none());
        assert_eq!(
            source.poll(t0 + Duration::from_secs(3)).map(|f| f.lat),
            Some(2.0)
        );
        assert!(source.exhausted());
    }

    #[test]
    fn untimed_fixes_are_spaced_one_second_apart() {
        let source = ReplaySource::new(vec![fix(1.0, None), fix(2.0, None), fix(3.0, None)]);
        let offsets: Vec<_> = source.into_schedule().into_iter().map(|(o, _)| o).collect();
        assert_eq!(
            offsets,
            vec![Duration::ZERO, Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn out_of_order_timestamps_do_not_rewind() {
        let source = ReplaySource::new(vec![fix(1.0, Some(5)), fix(2.0, Some(9)), fix(3.0, Some(7))]);
        let offsets: Vec<_> = source.into_schedule().into_iter().map(|(o, _)| o).collect();
        assert_eq!(offsets[2], Duration::from_secs(4));
    }
}
