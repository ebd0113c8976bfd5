use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle phase of a booking session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingPhase {
    #[default]
    Idle,
    PendingVerification,
    Active,
    Expired,
}

impl BookingPhase {
    /// True for the phases that hold an issued code.
    pub fn holds_code(self) -> bool {
        matches!(self, BookingPhase::PendingVerification | BookingPhase::Active)
    }
}

/// Why a session left the non-idle phases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndReason {
    Expired,
    EndedTrip,
    Cancelled,
    Superseded,
    ClockFault,
    AttemptsExhausted,
}

/// Emitted on every phase change so presentational layers can re-render.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PhaseChangedEvent {
    pub session_id: Uuid,
    pub from: BookingPhase,
    pub to: BookingPhase,
    pub vehicle_id: Option<String>,
    pub reason: Option<EndReason>,
    pub timestamp: i64,
}

impl PhaseChangedEvent {
    pub fn new(
        session_id: Uuid,
        from: BookingPhase,
        to: BookingPhase,
        vehicle_id: Option<String>,
        reason: Option<EndReason>,
    ) -> Self {
        Self {
            session_id,
            from,
            to,
            vehicle_id,
            reason,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
