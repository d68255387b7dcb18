mod driver;
mod error;
mod machine;
mod simulated;

pub use driver::NetworkDriver;
pub use error::NetworkError;
pub use machine::{ConnectivityMachine, ConnectivityPolicy, ConnectivitySnapshot, Role};
pub use simulated::SimulatedNetwork;
#[cfg(test)]
pub use simulated::NetworkAction;
