use std::time::{Duration, Instant};

use crate::config::Config;
use crate::connectivity::SimulatedNetwork;
use crate::controller::{Controller, ControllerStatus, WallClock};
use crate::position::{FixSource, ReplaySource};
use crate::store::MemoryStore;
use crate::track::DiskFs;

/// How long to keep cycling after the last fix so pending timers resolve.
const TAIL: Duration = Duration::from_secs(30);

/// Offline replay of a fix log on a simulated clock. Settings live in memory
/// only; track files are written to the configured directory.
pub struct Runner {
    pub config: Config,
    pub source: ReplaySource,
    pub store: MemoryStore,
}

pub struct ReplaySummary {
    pub fixes: usize,
    pub cycles: u64,
    pub connect_attempts: usize,
    pub status: ControllerStatus,
}

impl Runner {
    pub fn run(self) -> ReplaySummary {
        let Runner {
            config,
            mut source,
            store,
        } = self;

        let fixes = source.len();
        let interval = config.control.cycle_interval;
        let start = Instant::now();
        let mut controller = Controller::new(
            config.tracking_policy(),
            config.connectivity_policy(),
            DiskFs::new(config.tracking.tracks_dir.clone()),
            store,
            SimulatedNetwork::new(
                config.simulation.client_reachable,
                config.simulation.connect_delay,
            ),
            WallClock::Gps,
            start,
        );

        let mut elapsed = Duration::ZERO;
        let mut tail_end = None;
        let mut cycles = 0;
        let mut last_line = String::new();
        loop {
            let now = start + elapsed;
            let fix = source.poll(now);
            let had_fix = fix.is_some();
            controller.cycle(now, fix);
            cycles += 1;

            if had_fix {
                let line = status_line(&controller.status(now));
                if line != last_line {
                    println!("T+{:>7.1}s  {}", elapsed.as_secs_f64(), line);
                    last_line = line;
                }
            }

            if source.exhausted() {
                let end = *tail_end.get_or_insert(elapsed + TAIL);
                if elapsed >= end {
                    break;
                }
            }
            elapsed += interval;
        }

        let status = controller.status(start + elapsed);
        controller.shutdown();
        ReplaySummary {
            fixes,
            cycles,
            connect_attempts: controller.network().connect_attempts(),
            status,
        }
    }
}

fn status_line(status: &ControllerStatus) -> String {
    let distance = status
        .distance_km
        .map(|d| format!("{:.3} km", d))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "home {}  session {} ({} pts, {:.3} km)  network {}{}{}",
        distance,
        status.session.state,
        status.session.points,
        status.session.distance_km,
        status.connectivity.role,
        if status.connectivity.connected {
            " connected"
        } else {
            ""
        },
        if status.connectivity.locked_out {
            " locked-out"
        } else {
            ""
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionFix;
    use crate::store::Settings;
    use crate::track::{Filesystem, SessionState};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn fix(lat: f64, lon: f64, secs: u32) -> PositionFix {
        PositionFix {
            lat,
            lon,
            altitude_m: 0.0,
            speed_kmh: 0.0,
            valid: true,
            utc: Some(Utc.with_ymd_and_hms(2026, 10, 18, 7, 30, secs).unwrap()),
        }
    }

    #[test]
    fn replays_excursion_into_track_file() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.tracking.tracks_dir = dir.path().to_path_buf();

        let mut store = MemoryStore::new();
        Settings::default()
            .save_credentials(&mut store, "home-net", "secret")
            .unwrap();

        let summary = Runner {
            config,
            source: ReplaySource::new(vec![fix(0.2, 0.2, 0), fix(0.0001, 0.0001, 20)]),
            store,
        }
        .run();

        assert_eq!(summary.fixes, 2);
        assert_eq!(summary.status.session.state, SessionState::Idle);
        assert_eq!(summary.status.session.points, 0);
        // Away at 15 s, home from 20 s: the first connect happens at 20 s.
        assert_eq!(summary.connect_attempts, 1);
        assert!(summary.status.connectivity.connected);

        let fs = DiskFs::new(dir.path().to_path_buf());
        assert_eq!(fs.list().unwrap(), vec!["20261018T073000Z.gpx".to_string()]);
        let gpx = std::fs::read_to_string(dir.path().join("20261018T073000Z.gpx")).unwrap();
        assert_eq!(gpx.matches("<trkpt").count(), 1);
        assert!(gpx.ends_with("</gpx>\n"));
    }

    #[test]
    fn replays_demo_loop() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.tracking.tracks_dir = dir.path().to_path_buf();

        let mut store = MemoryStore::new();
        Settings::default()
            .save_home(&mut store, crate::geo::GeoPoint::new(47.3769, 8.5417))
            .unwrap();
        let fixes = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/excursion.jsonl");
        let source = ReplaySource::from_file(std::path::Path::new(fixes)).unwrap();

        let summary = Runner {
            config,
            source,
            store,
        }
        .run();

        assert_eq!(summary.fixes, 42);
        assert_eq!(summary.status.session.state, SessionState::Idle);
        // No credentials: the station never leaves standalone.
        assert_eq!(summary.connect_attempts, 0);

        let fs = DiskFs::new(dir.path().to_path_buf());
        assert_eq!(fs.list().unwrap(), vec!["20261018T073018Z.gpx".to_string()]);
        let gpx = std::fs::read_to_string(dir.path().join("20261018T073018Z.gpx")).unwrap();
        assert_eq!(gpx.matches("<trkpt").count(), 24);
    }
}
