use std::sync::{Arc, Mutex};

use crate::controller::{CommandSender, ControllerStatus};
use crate::track::DiskFs;

/// What request handlers may touch: the command queue, the last published
/// status and the track directory.
#[derive(Clone)]
pub struct AppState {
    pub commands: CommandSender,
    pub status: Arc<Mutex<ControllerStatus>>,
    pub tracks: Arc<DiskFs>,
}

impl AppState {
    pub fn status(&self) -> ControllerStatus {
        self.status.lock().unwrap().clone()
    }
}
