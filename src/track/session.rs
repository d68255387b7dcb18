use std::time::{Duration, Instant};

use serde::Serialize;
use utoipa::ToSchema;

use super::fs::Filesystem;
use super::writer::{SessionHandle, TrackPoint, TrackWriter};
use crate::controller::CycleContext;
use crate::geo::{distance_km, GeoPoint};
use crate::position::PositionFix;

#[derive(Debug, Clone, Copy)]
pub struct TrackingPolicy {
    pub radius_km: f64,
    /// Minimum time between two logged points.
    pub min_interval: Duration,
    /// Minimum displacement between two logged points.
    pub min_displacement_m: f64,
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self {
            radius_km: 0.1,
            min_interval: Duration::from_secs(1),
            min_displacement_m: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
pub enum SessionState {
    Idle,
    Recording,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub track: Option<String>,
    pub elapsed_s: u64,
    pub points: u32,
    pub distance_km: f64,
    pub max_speed_kmh: f64,
    pub avg_speed_kmh: f64,
    pub elevation_gain_m: f64,
    /// Points that could not be written to the track file.
    pub lost_points: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct SessionStats {
    points: u32,
    distance_km: f64,
    max_speed_kmh: f64,
    avg_speed_kmh: f64,
    elevation_gain_m: f64,
}

#[derive(Debug, Clone, Copy)]
struct LoggedPoint {
    position: GeoPoint,
    altitude_m: f64,
    at: Instant,
}

struct OpenSession<W> {
    handle: SessionHandle<W>,
    started: Instant,
    stats: SessionStats,
    last: Option<LoggedPoint>,
}

/// Opens and closes recording sessions on geofence edges or manual toggles.
///
/// The open track handle lives inside the session, so "a file is open" and
/// "state is Recording" cannot disagree.
pub struct TrackingMachine<F: Filesystem> {
    policy: TrackingPolicy,
    writer: TrackWriter<F>,
    session: Option<OpenSession<F::File>>,
    has_left_home: bool,
}

impl<F: Filesystem> TrackingMachine<F> {
    pub fn new(policy: TrackingPolicy, writer: TrackWriter<F>) -> Self {
        Self {
            policy,
            writer,
            session: None,
            has_left_home: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.session.is_some() {
            SessionState::Recording
        } else {
            SessionState::Idle
        }
    }

    /// Automatic transitions and point logging. Does nothing without a fresh
    /// valid fix.
    pub fn evaluate(&mut self, ctx: &CycleContext) {
        let (Some(fix), Some(distance)) = (ctx.fix.filter(|f| f.valid), ctx.distance_km) else {
            return;
        };

        if ctx.auto_tracking {
            if distance > self.policy.radius_km && !self.has_left_home {
                // The edge is consumed even if the file cannot be opened; the
                // next attempt happens on the next excursion.
                self.has_left_home = true;
                log::info!("Left home geofence ({:.3} km)", distance);
                if self.session.is_none() {
                    self.start(ctx);
                }
            } else if distance < self.policy.radius_km {
                if self.session.is_some() {
                    log::info!("Back inside home geofence ({:.3} km)", distance);
                    self.stop();
                }
                self.has_left_home = false;
            }
        }

        if self.session.is_some() {
            self.log_point(ctx, fix);
        }
    }

    /// Manual start/stop, independent of the auto-tracking flag.
    pub fn toggle(&mut self, ctx: &CycleContext) {
        if self.session.is_some() {
            log::info!("Manual stop");
            self.stop();
        } else {
            log::info!("Manual start");
            self.start(ctx);
        }
    }

    /// Closes any open session, e.g. on shutdown.
    pub fn close(&mut self) {
        if self.session.is_some() {
            self.stop();
        }
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        match &self.session {
            Some(session) => SessionSnapshot {
                state: self.state(),
                track: Some(session.handle.name().to_string()),
                elapsed_s: now.saturating_duration_since(session.started).as_secs(),
                points: session.stats.points,
                distance_km: session.stats.distance_km,
                max_speed_kmh: session.stats.max_speed_kmh,
                avg_speed_kmh: session.stats.avg_speed_kmh,
                elevation_gain_m: session.stats.elevation_gain_m,
                lost_points: session.handle.failed_writes(),
            },
            None => SessionSnapshot {
                state: self.state(),
                track: None,
                elapsed_s: 0,
                points: 0,
                distance_km: 0.0,
                max_speed_kmh: 0.0,
                avg_speed_kmh: 0.0,
                elevation_gain_m: 0.0,
                lost_points: 0,
            },
        }
    }

    fn start(&mut self, ctx: &CycleContext) {
        match self.writer.begin_session(ctx.wall_clock) {
            Ok(handle) => {
                self.session = Some(OpenSession {
                    handle,
                    started: ctx.now,
                    stats: SessionStats::default(),
                    last: None,
                });
                log::info!("Tracking: {} -> {}", SessionState::Idle, SessionState::Recording);
            }
            Err(e) => log::error!("Cannot start recording, staying idle: {}", e),
        }
    }

    fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let stats = session.stats;
        if let Err(e) = self.writer.end_session(session.handle) {
            log::error!("Failed to close track cleanly: {}", e);
        }
        log::info!(
            "Tracking: {} -> {} ({} points, {:.3} km)",
            SessionState::Recording,
            SessionState::Idle,
            stats.points,
            stats.distance_km
        );
    }

    fn log_point(&mut self, ctx: &CycleContext, fix: &PositionFix) {
        let policy = self.policy;
        let now = ctx.now;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let position = fix.point();

        let step_km = match session.last {
            Some(last) => {
                if now.saturating_duration_since(last.at) < policy.min_interval {
                    return;
                }
                let step_km = distance_km(last.position, position);
                if step_km * 1000.0 < policy.min_displacement_m {
                    log::debug!("Skipping point {:.1} m from the last one", step_km * 1000.0);
                    return;
                }
                step_km
            }
            None => 0.0,
        };

        let stats = &mut session.stats;
        stats.distance_km += step_km;
        stats.max_speed_kmh = stats.max_speed_kmh.max(fix.speed_kmh);
        let elapsed_h = now.saturating_duration_since(session.started).as_secs_f64() / 3600.0;
        if elapsed_h > 0.0 {
            stats.avg_speed_kmh = stats.distance_km / elapsed_h;
        }
        if let Some(last) = session.last {
            let climb = fix.altitude_m - last.altitude_m;
            if climb > 0.0 {
                stats.elevation_gain_m += climb;
            }
        }

        self.writer.append_point(
            &mut session.handle,
            &TrackPoint {
                lat: fix.lat,
                lon: fix.lon,
                elevation_m: fix.altitude_m,
                time: fix.utc.or(ctx.wall_clock),
            },
        );
        stats.points += 1;
        session.last = Some(LoggedPoint {
            position,
            altitude_m: fix.altitude_m,
            at: now,
        });
    }
}

#[cfg(test)]
impl<F: Filesystem> TrackingMachine<F> {
    pub fn has_left_home(&self) -> bool {
        self.has_left_home
    }

    pub fn active_track(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.handle.name())
    }
}
