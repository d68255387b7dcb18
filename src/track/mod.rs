mod error;
mod fs;
mod library;
mod session;
mod writer;

pub use error::StorageError;
pub use fs::{DiskFs, Filesystem};
#[cfg(test)]
pub use fs::MemoryFs;
pub use library::{list_tracks, remove_track, TrackInfo};
pub use session::{SessionSnapshot, SessionState, TrackingMachine, TrackingPolicy};
pub use writer::TrackWriter;
