mod clock;
mod command;
mod context;

pub use clock::WallClock;
pub use command::{Command, CommandSender};
pub use context::CycleContext;

use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use serde::Serialize;
use utoipa::ToSchema;

use self::clock::ClockState;
use crate::connectivity::{
    ConnectivityMachine, ConnectivityPolicy, ConnectivitySnapshot, NetworkDriver,
};
use crate::geo::{distance_km, GeoPoint};
use crate::position::PositionFix;
use crate::store::{KeyValueStore, Settings};
use crate::track::{Filesystem, SessionSnapshot, TrackWriter, TrackingMachine, TrackingPolicy};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ControllerStatus {
    pub session: SessionSnapshot,
    pub connectivity: ConnectivitySnapshot,
    pub home: GeoPoint,
    pub auto_tracking: bool,
    pub distance_km: Option<f64>,
    pub has_fix: bool,
}

/// One control cycle per call: fix → distance → both machines → commands.
pub struct Controller<F: Filesystem, S: KeyValueStore, N: NetworkDriver> {
    settings: Settings,
    store: S,
    network: N,
    tracking: TrackingMachine<F>,
    connectivity: ConnectivityMachine,
    clock: ClockState,
    commands_tx: CommandSender,
    commands_rx: Receiver<Command>,
    latest_fix: Option<PositionFix>,
    distance_km: Option<f64>,
}

impl<F: Filesystem, S: KeyValueStore, N: NetworkDriver> Controller<F, S, N> {
    pub fn new(
        tracking: TrackingPolicy,
        connectivity: ConnectivityPolicy,
        fs: F,
        store: S,
        mut network: N,
        clock: WallClock,
        now: Instant,
    ) -> Self {
        let settings = Settings::load(&store);
        log::info!(
            "Home {:.6},{:.6}, auto tracking {}, credentials {}",
            settings.home.latitude_deg,
            settings.home.longitude_deg,
            if settings.auto_tracking { "on" } else { "off" },
            if settings.credentials.is_some() { "stored" } else { "absent" },
        );
        if (tracking.radius_km - connectivity.radius_km).abs() > f64::EPSILON {
            log::info!(
                "Separate geofences: tracking {:.3} km, connectivity {:.3} km",
                tracking.radius_km, connectivity.radius_km
            );
        }

        let connectivity = ConnectivityMachine::start(connectivity, now, &mut network);
        let (commands_tx, commands_rx) = mpsc::channel();
        Self {
            settings,
            store,
            network,
            tracking: TrackingMachine::new(tracking, TrackWriter::new(fs)),
            connectivity,
            clock: ClockState::new(clock),
            commands_tx,
            commands_rx,
            latest_fix: None,
            distance_km: None,
        }
    }

    /// Queue handle for collaborators; commands apply at the end of the next cycle.
    pub fn commands(&self) -> CommandSender {
        self.commands_tx.clone()
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn cycle(&mut self, now: Instant, fix: Option<PositionFix>) {
        let fix = fix.filter(|f| {
            if !f.valid {
                log::debug!("Ignoring fix without a solution");
            }
            f.valid
        });

        if let Some(fix) = &fix {
            self.distance_km = Some(distance_km(self.settings.home, fix.point()));
            if let Some(utc) = fix.utc {
                self.clock.observe_fix(utc, now);
            }
            self.latest_fix = Some(fix.clone());
        }

        let ctx = CycleContext {
            now,
            wall_clock: self.clock.now_utc(now),
            fix: fix.as_ref(),
            distance_km: self.distance_km,
            auto_tracking: self.settings.auto_tracking,
        };

        self.tracking.evaluate(&ctx);
        self.connectivity.evaluate(
            &ctx,
            self.settings.credentials.as_ref(),
            &mut self.network,
        );
        self.apply_commands(&ctx);
    }

    pub fn status(&self, now: Instant) -> ControllerStatus {
        ControllerStatus {
            session: self.tracking.snapshot(now),
            connectivity: self.connectivity.snapshot(),
            home: self.settings.home,
            auto_tracking: self.settings.auto_tracking,
            distance_km: self.distance_km,
            has_fix: self.latest_fix.is_some(),
        }
    }

    /// Closes an open track so the file ends well-formed.
    pub fn shutdown(&mut self) {
        self.tracking.close();
    }

    fn apply_commands(&mut self, ctx: &CycleContext) {
        while let Ok(command) = self.commands_rx.try_recv() {
            log::info!("Command: {}", command.name());
            match command {
                Command::SetHome => self.set_home(),
                Command::ToggleTracking => self.tracking.toggle(ctx),
                Command::ToggleAutoTracking => {
                    let enabled = !self.settings.auto_tracking;
                    match self.settings.save_auto_tracking(&mut self.store, enabled) {
                        Ok(()) => log::info!("Auto tracking {}", if enabled { "on" } else { "off" }),
                        Err(e) => log::error!("Failed to persist auto tracking flag: {}", e),
                    }
                }
                Command::UpdateCredentials { ssid, secret } => {
                    match self
                        .settings
                        .save_credentials(&mut self.store, &ssid, &secret)
                    {
                        Ok(()) => self
                            .connectivity
                            .credentials_updated(self.settings.credentials.as_ref()),
                        Err(e) => log::error!("Failed to persist credentials: {}", e),
                    }
                }
            }
        }
    }

    fn set_home(&mut self) {
        let Some(fix) = &self.latest_fix else {
            log::warn!("No valid fix yet, home unchanged");
            return;
        };
        let home = fix.point();
        match self.settings.save_home(&mut self.store, home) {
            Ok(()) => {
                log::info!("Home set to {:.6},{:.6}", home.latitude_deg, home.longitude_deg);
                self.distance_km = Some(0.0);
            }
            Err(e) => log::error!("Failed to persist home: {}", e),
        }
    }
}

#[cfg(test)]
impl<F: Filesystem, S: KeyValueStore, N: NetworkDriver> Controller<F, S, N> {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }
}
