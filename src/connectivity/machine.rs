use std::time::{Duration, Instant};

use serde::Serialize;
use utoipa::ToSchema;

use super::{NetworkDriver, NetworkError};
use crate::controller::CycleContext;
use crate::store::Credentials;

#[derive(Debug, Clone, Copy)]
pub struct ConnectivityPolicy {
    pub radius_km: f64,
    /// Minimum spacing between role-affecting actions.
    pub dwell: Duration,
    pub connect_timeout: Duration,
    /// Consecutive timeouts before automatic connects stop.
    pub max_failures: u8,
}

impl Default for ConnectivityPolicy {
    fn default() -> Self {
        Self {
            radius_km: 0.1,
            dwell: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            max_failures: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
pub enum Role {
    Client,
    Standalone,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConnectivitySnapshot {
    pub role: Role,
    pub connected: bool,
    pub locked_out: bool,
    pub consecutive_failures: u8,
    pub connecting: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingAttempt {
    deadline: Instant,
}

/// Chooses between joining the home network and running a standalone access
/// point.
///
/// A connect attempt is a pending state with a deadline rather than a blocking
/// wait, so control cycles keep running while the radio associates. The
/// attempt counts as one role-affecting action from its start to its outcome.
#[derive(Debug)]
pub struct ConnectivityMachine {
    policy: ConnectivityPolicy,
    role: Role,
    connected: bool,
    last_role_switch: Instant,
    failures: u8,
    locked_out: bool,
    attempt: Option<PendingAttempt>,
    reconnect_requested: bool,
}

impl ConnectivityMachine {
    /// Boots in standalone mode; the dwell interval runs from `now`.
    pub fn start<N: NetworkDriver>(
        policy: ConnectivityPolicy,
        now: Instant,
        net: &mut N,
    ) -> Self {
        if let Err(e) = net.start_access_point() {
            log::error!("Failed to start access point: {}", e);
        }
        log::info!("Network role: {}", Role::Standalone);
        Self {
            policy,
            role: Role::Standalone,
            connected: false,
            last_role_switch: now,
            failures: 0,
            locked_out: false,
            attempt: None,
            reconnect_requested: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn locked_out(&self) -> bool {
        self.locked_out
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        ConnectivitySnapshot {
            role: self.role(),
            connected: self.connected(),
            locked_out: self.locked_out(),
            consecutive_failures: self.failures,
            connecting: self.attempt.is_some(),
        }
    }

    pub fn evaluate<N: NetworkDriver>(
        &mut self,
        ctx: &CycleContext,
        credentials: Option<&Credentials>,
        net: &mut N,
    ) {
        let now = ctx.now;

        if let Some(attempt) = self.attempt {
            self.poll_attempt(now, attempt, net);
            return;
        }

        if self.role == Role::Client && self.connected && !net.link_up(now) {
            log::warn!("Client link lost");
            self.connected = false;
        }

        if now.saturating_duration_since(self.last_role_switch) < self.policy.dwell {
            return;
        }

        let Some(credentials) = credentials else {
            if self.role != Role::Standalone {
                log::info!("No credentials stored");
                self.force_standalone(now, net);
            }
            return;
        };

        if self.reconnect_requested {
            self.reconnect_requested = false;
            self.begin_attempt(now, credentials, net);
            return;
        }

        // No valid fix yet reads as "at home".
        let at_home = ctx.distance_km.map_or(true, |d| d < self.policy.radius_km);
        if at_home {
            if !self.locked_out && (self.role == Role::Standalone || !self.connected) {
                self.begin_attempt(now, credentials, net);
            }
        } else if self.role != Role::Standalone {
            log::info!("Away from home, leaving client mode");
            self.force_standalone(now, net);
        }
    }

    /// New credentials lift the lockout. The next permitted cycle connects
    /// with them, or falls back to standalone when they are empty.
    pub fn credentials_updated(&mut self, credentials: Option<&Credentials>) {
        self.locked_out = false;
        self.failures = 0;
        self.reconnect_requested = credentials.is_some();
        match credentials {
            Some(c) => log::info!("Credentials updated for {}, reconnect queued", c.ssid),
            None => log::info!("Credentials cleared"),
        }
    }

    fn begin_attempt<N: NetworkDriver>(
        &mut self,
        now: Instant,
        credentials: &Credentials,
        net: &mut N,
    ) {
        match self.role {
            Role::Standalone => net.stop_access_point(),
            Role::Client => net.disconnect(),
        }
        if self.role != Role::Client {
            log::info!("Network role: {} -> {}", self.role, Role::Client);
        }
        self.role = Role::Client;
        self.connected = false;

        log::info!(
            "Connecting to {} (attempt {}/{})",
            credentials.ssid,
            self.failures + 1,
            self.policy.max_failures
        );
        if let Err(e) = net.begin_connect(credentials, now) {
            // The attempt still runs to its deadline.
            log::warn!("Connect request rejected: {}", e);
        }
        self.attempt = Some(PendingAttempt {
            deadline: now + self.policy.connect_timeout,
        });
        self.last_role_switch = now;
    }

    fn poll_attempt<N: NetworkDriver>(
        &mut self,
        now: Instant,
        attempt: PendingAttempt,
        net: &mut N,
    ) {
        if net.link_up(now) {
            log::info!("Client connected");
            self.attempt = None;
            self.connected = true;
            self.failures = 0;
            self.locked_out = false;
            self.last_role_switch = now;
            return;
        }
        if now < attempt.deadline {
            return;
        }

        self.attempt = None;
        self.last_role_switch = now;
        self.failures += 1;
        log::warn!(
            "{} ({}/{})",
            NetworkError::Timeout,
            self.failures,
            self.policy.max_failures
        );

        if self.failures >= self.policy.max_failures {
            log::warn!("Too many failed connects, automatic reconnection disabled");
            self.locked_out = true;
            self.failures = 0;
            self.force_standalone(now, net);
        } else {
            net.disconnect();
        }
    }

    fn force_standalone<N: NetworkDriver>(&mut self, now: Instant, net: &mut N) {
        if self.role == Role::Client {
            net.disconnect();
        }
        if let Err(e) = net.start_access_point() {
            log::error!("Failed to start access point: {}", e);
        }
        log::info!("Network role: {} -> {}", self.role, Role::Standalone);
        self.role = Role::Standalone;
        self.connected = false;
        self.last_role_switch = now;
    }
}
