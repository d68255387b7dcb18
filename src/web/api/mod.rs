pub mod control;
pub mod error;
pub mod tracks;
