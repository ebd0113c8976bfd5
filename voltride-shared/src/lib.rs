pub mod models;
pub mod redact;

pub use models::events::{BookingPhase, EndReason, PhaseChangedEvent};
pub use models::vehicle::{Vehicle, VehicleRecord};
pub use redact::Masked;
