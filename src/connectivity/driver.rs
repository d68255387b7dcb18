use std::time::Instant;

use super::NetworkError;
use crate::store::Credentials;

/// Radio operations the connectivity machine needs. Every call must return
/// promptly; association progress is observed through [`NetworkDriver::link_up`].
pub trait NetworkDriver {
    /// Starts associating with the configured network.
    fn begin_connect(&mut self, credentials: &Credentials, now: Instant)
        -> Result<(), NetworkError>;
    fn link_up(&mut self, now: Instant) -> bool;
    fn disconnect(&mut self);
    fn start_access_point(&mut self) -> Result<(), NetworkError>;
    fn stop_access_point(&mut self);
}
