mod error;
mod fix;
mod parsing;
mod replay;

pub use error::FixSourceError;
pub use fix::PositionFix;
pub use replay::ReplaySource;

use std::time::Instant;

/// Anything that delivers decoded fixes on an "updated" edge.
pub trait FixSource {
    /// Returns a fix only when a new one became available since the last call.
    fn poll(&mut self, now: Instant) -> Option<PositionFix>;

    /// True once the source will never yield another fix.
    fn exhausted(&self) -> bool {
        false
    }
}
