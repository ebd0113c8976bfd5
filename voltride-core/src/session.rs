use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;
use voltride_shared::{BookingPhase, EndReason, Masked, PhaseChangedEvent};

use crate::clock::SessionClock;
use crate::config::SessionConfig;
use crate::otp::CodeIssuer;
use crate::resolver::VehicleResolver;
use crate::{BookingError, BookingResult};

/// Default length of an active trip (15 minutes).
pub const ACTIVE_DURATION_SECONDS: u32 = 15 * 60;

const EVENT_CAPACITY: usize = 64;

/// Consistent view of the session, taken under one lock.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub phase: BookingPhase,
    pub vehicle_id: Option<String>,
    /// Only present while the code is waiting to be entered on the vehicle.
    pub pending_code: Option<Masked<String>>,
    pub remaining_seconds: u32,
    pub remaining_display: String,
    pub verified: bool,
}

/// Render a countdown as `MM:SS`.
pub fn format_remaining(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Default)]
struct SessionState {
    session_id: Option<Uuid>,
    phase: BookingPhase,
    vehicle_id: Option<String>,
    issued_code: Option<Masked<String>>,
    last_code: Option<Masked<String>>,
    remaining_seconds: u32,
    verified: bool,
    failed_attempts: u32,
    /// Bumped on every start and reset; ticks armed under an older value are ignored.
    generation: u64,
    clock: SessionClock,
}

#[derive(Debug)]
enum Verification {
    Verified,
    AlreadyActive,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        let pending_code = match self.phase {
            BookingPhase::PendingVerification => self.issued_code.clone(),
            _ => None,
        };
        SessionSnapshot {
            session_id: self.session_id,
            phase: self.phase,
            vehicle_id: self.vehicle_id.clone(),
            pending_code,
            remaining_seconds: self.remaining_seconds,
            remaining_display: format_remaining(self.remaining_seconds),
            verified: self.verified,
        }
    }

    fn event(&self, from: BookingPhase, reason: Option<EndReason>) -> PhaseChangedEvent {
        PhaseChangedEvent::new(
            self.session_id.unwrap_or_else(Uuid::nil),
            from,
            self.phase,
            self.vehicle_id.clone(),
            reason,
        )
    }

    /// Idle → PendingVerification, superseding whatever was open.
    fn begin(&mut self, vehicle_id: String, code: String) -> Vec<PhaseChangedEvent> {
        let mut events = self.reset(EndReason::Superseded);

        self.generation += 1;
        self.session_id = Some(Uuid::new_v4());
        self.phase = BookingPhase::PendingVerification;
        self.vehicle_id = Some(vehicle_id);
        let code = Masked::new(code);
        self.issued_code = Some(code.clone());
        self.last_code = Some(code);
        self.remaining_seconds = 0;
        self.verified = false;
        self.failed_attempts = 0;

        events.push(self.event(BookingPhase::Idle, None));
        events
    }

    fn verify(
        &mut self,
        code: &str,
        duration: u32,
        max_attempts: Option<u32>,
    ) -> Result<(Verification, Vec<PhaseChangedEvent>), BookingError> {
        let matches = self
            .issued_code
            .as_ref()
            .is_some_and(|issued| issued.expose() == code.trim());

        match self.phase {
            BookingPhase::Idle | BookingPhase::Expired => Err(BookingError::NoActiveSession),
            BookingPhase::Active if matches => Ok((Verification::AlreadyActive, Vec::new())),
            BookingPhase::Active => Err(BookingError::CodeMismatch { attempts_remaining: None }),
            BookingPhase::PendingVerification if matches => {
                self.phase = BookingPhase::Active;
                self.verified = true;
                self.remaining_seconds = duration;
                let event = self.event(BookingPhase::PendingVerification, None);
                Ok((Verification::Verified, vec![event]))
            }
            BookingPhase::PendingVerification => {
                self.failed_attempts += 1;
                match max_attempts {
                    Some(max) if self.failed_attempts >= max => {
                        Err(BookingError::AttemptsExhausted)
                    }
                    Some(max) => Err(BookingError::CodeMismatch {
                        attempts_remaining: Some(max - self.failed_attempts),
                    }),
                    None => Err(BookingError::CodeMismatch { attempts_remaining: None }),
                }
            }
        }
    }

    /// Apply `elapsed` seconds from the clock armed under `generation`.
    fn apply_tick(&mut self, generation: u64, elapsed: u64) -> (Vec<PhaseChangedEvent>, ControlFlow<()>) {
        if generation != self.generation || self.phase != BookingPhase::Active {
            return (Vec::new(), ControlFlow::Break(()));
        }

        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
        self.remaining_seconds = self.remaining_seconds.saturating_sub(elapsed);
        if self.remaining_seconds > 0 {
            debug!(remaining = self.remaining_seconds, "Trip countdown tick");
            return (Vec::new(), ControlFlow::Continue(()));
        }

        (self.expire(), ControlFlow::Break(()))
    }

    /// Active → Expired → Idle.
    fn expire(&mut self) -> Vec<PhaseChangedEvent> {
        self.clock.stop();
        self.generation += 1;

        self.phase = BookingPhase::Expired;
        self.issued_code = None;
        self.verified = false;
        self.remaining_seconds = 0;
        let expired = self.event(BookingPhase::Active, Some(EndReason::Expired));

        let closed = self.clear(BookingPhase::Expired, EndReason::Expired);
        vec![expired, closed]
    }

    /// Any phase → Idle. No-op when already idle.
    fn reset(&mut self, reason: EndReason) -> Vec<PhaseChangedEvent> {
        if self.phase == BookingPhase::Idle {
            return Vec::new();
        }
        self.clock.stop();
        self.generation += 1;
        let from = self.phase;
        vec![self.clear(from, reason)]
    }

    fn clear(&mut self, from: BookingPhase, reason: EndReason) -> PhaseChangedEvent {
        let vehicle_id = self.vehicle_id.take();
        let session_id = self.session_id.take();
        self.phase = BookingPhase::Idle;
        self.issued_code = None;
        self.remaining_seconds = 0;
        self.verified = false;
        self.failed_attempts = 0;

        info!(?session_id, ?vehicle_id, ?reason, "Booking session closed");
        PhaseChangedEvent::new(
            session_id.unwrap_or_else(Uuid::nil),
            from,
            BookingPhase::Idle,
            vehicle_id,
            Some(reason),
        )
    }

    #[cfg(test)]
    fn invariants_hold(&self) -> bool {
        let code_iff_holding = self.issued_code.is_some() == self.phase.holds_code();
        let time_only_when_active =
            (self.remaining_seconds > 0) == (self.phase == BookingPhase::Active);
        let vehicle_iff_open = self.vehicle_id.is_some() == (self.phase != BookingPhase::Idle);
        let verified_only_when_active = !self.verified || self.phase == BookingPhase::Active;
        code_iff_holding && time_only_when_active && vehicle_iff_open && verified_only_when_active
    }
}

struct Shared {
    state: Mutex<SessionState>,
    events: broadcast::Sender<PhaseChangedEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, events: Vec<PhaseChangedEvent>) {
        for event in events {
            // No subscribers is fine; polling the query surface is also valid.
            let _ = self.events.send(event);
        }
    }

    fn on_tick(&self, generation: u64, elapsed: u64) -> ControlFlow<()> {
        let mut state = self.lock();
        let (events, flow) = state.apply_tick(generation, elapsed);
        self.publish(events);
        flow
    }
}

/// OTP-gated unlock workflow for one rider: issue a code for a vehicle, wait
/// for it to be entered on the vehicle, then run a bounded trip.
///
/// Every operation takes the same lock, so timer ticks and caller operations
/// are serialised and the query surface never sees a half-applied change.
pub struct BookingSession {
    shared: Arc<Shared>,
    resolver: Arc<dyn VehicleResolver>,
    issuer: Arc<dyn CodeIssuer>,
    config: SessionConfig,
}

impl BookingSession {
    pub fn new(config: SessionConfig, resolver: Arc<dyn VehicleResolver>) -> Self {
        let issuer = config.issuer();
        Self::with_issuer(config, resolver, issuer)
    }

    pub fn with_issuer(
        config: SessionConfig,
        resolver: Arc<dyn VehicleResolver>,
        issuer: Arc<dyn CodeIssuer>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                events,
            }),
            resolver,
            issuer,
            config,
        }
    }

    /// Issue a code for `vehicle_id` and wait for verification. An open
    /// session is cancelled first.
    pub fn start_booking(&self, vehicle_id: &str) -> BookingResult<SessionSnapshot> {
        let vehicle_id = vehicle_id.trim();
        if vehicle_id.is_empty() || !self.resolver.vehicle_exists(vehicle_id) {
            warn!(vehicle_id, "Booking requested for unknown vehicle");
            return Err(BookingError::UnknownVehicle(vehicle_id.to_string()));
        }

        let mut state = self.shared.lock();
        let previous = state.last_code.as_ref().map(|code| code.expose().clone());
        let code = self.issuer.issue(previous.as_deref());
        let events = state.begin(vehicle_id.to_string(), code);
        info!(session_id = ?state.session_id, vehicle_id, "Unlock code issued");
        self.shared.publish(events);
        Ok(state.snapshot())
    }

    /// Check a code entered on the vehicle. A match starts the trip countdown.
    pub fn submit_code(&self, code: &str) -> BookingResult<SessionSnapshot> {
        let mut state = self.shared.lock();
        let outcome = state.verify(
            code,
            self.config.active_duration_seconds.max(1),
            self.config.max_code_attempts,
        );

        let events = match outcome {
            Ok((Verification::AlreadyActive, _)) => return Ok(state.snapshot()),
            Ok((Verification::Verified, events)) => events,
            Err(BookingError::AttemptsExhausted) => {
                warn!(session_id = ?state.session_id, "Code attempts exhausted");
                let events = state.reset(EndReason::AttemptsExhausted);
                self.shared.publish(events);
                return Err(BookingError::AttemptsExhausted);
            }
            Err(err) => {
                if let BookingError::CodeMismatch { .. } = err {
                    warn!(session_id = ?state.session_id, attempts = state.failed_attempts, "Incorrect unlock code");
                }
                return Err(err);
            }
        };

        let generation = state.generation;
        let shared = Arc::downgrade(&self.shared);
        let armed = state.clock.start(self.config.tick_period(), move |elapsed| {
            match shared.upgrade() {
                Some(shared) => shared.on_tick(generation, elapsed),
                None => ControlFlow::Break(()),
            }
        });

        if let Err(fault) = armed {
            tracing::error!(error = %fault, "Trip clock failed to arm; closing session");
            let mut events = events;
            events.extend(state.reset(EndReason::ClockFault));
            self.shared.publish(events);
            return Err(BookingError::ClockFault(fault));
        }

        info!(
            session_id = ?state.session_id,
            vehicle_id = ?state.vehicle_id,
            seconds = state.remaining_seconds,
            "Vehicle unlocked; trip started"
        );
        self.shared.publish(events);
        Ok(state.snapshot())
    }

    /// Finish the trip early. Returns false when nothing was open.
    pub fn end_trip(&self) -> bool {
        self.close(EndReason::EndedTrip)
    }

    /// Abandon the booking. Returns false when nothing was open.
    pub fn cancel(&self) -> bool {
        self.close(EndReason::Cancelled)
    }

    fn close(&self, reason: EndReason) -> bool {
        let mut state = self.shared.lock();
        let events = state.reset(reason);
        let closed = !events.is_empty();
        self.shared.publish(events);
        closed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().snapshot()
    }

    pub fn current_phase(&self) -> BookingPhase {
        self.shared.lock().phase
    }

    pub fn current_vehicle_id(&self) -> Option<String> {
        self.shared.lock().vehicle_id.clone()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.shared.lock().remaining_seconds
    }

    pub fn is_verified(&self) -> bool {
        self.shared.lock().verified
    }

    pub fn is_clock_armed(&self) -> bool {
        self.shared.lock().clock.is_armed()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PhaseChangedEvent> {
        self.shared.events.subscribe()
    }
}
