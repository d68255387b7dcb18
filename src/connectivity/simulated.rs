use std::time::{Duration, Instant};

use super::{NetworkDriver, NetworkError};
use crate::store::Credentials;

const MAX_SSID_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkAction {
    Connect(String),
    Disconnect,
    StartAccessPoint,
    StopAccessPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Down,
    Associating { since: Instant },
    Up,
}

/// Stand-in radio: association succeeds after `connect_delay` when the
/// network is reachable and never otherwise.
#[derive(Debug)]
pub struct SimulatedNetwork {
    reachable: bool,
    connect_delay: Duration,
    link: Link,
    access_point: bool,
    actions: Vec<(Instant, NetworkAction)>,
    last_now: Option<Instant>,
}

impl SimulatedNetwork {
    pub fn new(reachable: bool, connect_delay: Duration) -> Self {
        Self {
            reachable,
            connect_delay,
            link: Link::Down,
            access_point: false,
            actions: Vec::new(),
            last_now: None,
        }
    }

    #[cfg(test)]
    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
        if !reachable && self.link == Link::Up {
            self.link = Link::Down;
        }
    }

    #[cfg(test)]
    pub fn access_point_active(&self) -> bool {
        self.access_point
    }

    /// Every radio action with the time it was requested.
    #[cfg(test)]
    pub fn actions(&self) -> &[(Instant, NetworkAction)] {
        &self.actions
    }

    pub fn connect_attempts(&self) -> usize {
        self.actions
            .iter()
            .filter(|(_, a)| matches!(a, NetworkAction::Connect(_)))
            .count()
    }

    fn record(&mut self, action: NetworkAction) {
        // Actions without a time of their own are stamped with the latest one seen.
        let at = self.last_now.unwrap_or_else(Instant::now);
        self.actions.push((at, action));
    }
}

impl NetworkDriver for SimulatedNetwork {
    fn begin_connect(
        &mut self,
        credentials: &Credentials,
        now: Instant,
    ) -> Result<(), NetworkError> {
        self.last_now = Some(now);
        if credentials.ssid.len() > MAX_SSID_LEN {
            return Err(NetworkError::Driver(format!(
                "ssid longer than {MAX_SSID_LEN} bytes"
            )));
        }
        self.record(NetworkAction::Connect(credentials.ssid.clone()));
        self.link = Link::Associating { since: now };
        Ok(())
    }

    fn link_up(&mut self, now: Instant) -> bool {
        self.last_now = Some(now);
        if let Link::Associating { since } = self.link {
            if self.reachable && now.saturating_duration_since(since) >= self.connect_delay {
                self.link = Link::Up;
            }
        }
        self.link == Link::Up
    }

    fn disconnect(&mut self) {
        self.record(NetworkAction::Disconnect);
        self.link = Link::Down;
    }

    fn start_access_point(&mut self) -> Result<(), NetworkError> {
        self.record(NetworkAction::StartAccessPoint);
        self.access_point = true;
        Ok(())
    }

    fn stop_access_point(&mut self) {
        self.record(NetworkAction::StopAccessPoint);
        self.access_point = false;
    }
}
