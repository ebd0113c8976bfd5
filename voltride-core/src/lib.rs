pub mod clock;
pub mod config;
pub mod otp;
pub mod resolver;
pub mod session;

pub use clock::{ClockError, SessionClock};
pub use config::{CodePolicy, SessionConfig};
pub use otp::{CodeIssuer, FixedCodeIssuer, RandomCodeIssuer};
pub use resolver::VehicleResolver;
pub use session::{format_remaining, BookingSession, SessionSnapshot, ACTIVE_DURATION_SECONDS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Unknown vehicle: {0}")]
    UnknownVehicle(String),
    #[error("No booking is waiting for a code")]
    NoActiveSession,
    #[error("Incorrect code entered; use the code shown in the app")]
    CodeMismatch { attempts_remaining: Option<u32> },
    #[error("Too many incorrect codes; the booking was cancelled")]
    AttemptsExhausted,
    #[error("Session clock could not be armed: {0}")]
    ClockFault(#[from] ClockError),
}

pub type BookingResult<T> = Result<T, BookingError>;
