pub mod fleet;

pub use fleet::{Fleet, FleetError, DEFAULT_CENTER};
