use axum::{
    extract::{Extension, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use voltride_core::SessionSnapshot;
use voltride_shared::Vehicle;

use crate::{error::AppError, middleware::RiderClaims, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartBookingRequest {
    pub vehicle_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub session: SessionSnapshot,
    /// Details of the vehicle under booking, for the "active booking" panel.
    pub vehicle: Option<Vehicle>,
}

#[derive(Debug, Serialize)]
pub struct CloseResponse {
    pub closed: bool,
    #[serde(flatten)]
    pub session: SessionSnapshot,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(start_booking))
        .route("/v1/bookings/current", get(current_booking))
        .route("/v1/bookings/verify", post(verify_code))
        .route("/v1/bookings/end", post(end_trip))
        .route("/v1/bookings/cancel", post(cancel_booking))
        .route("/v1/bookings/stream", get(stream_events))
}

fn respond(state: &AppState, session: SessionSnapshot) -> Json<BookingResponse> {
    let vehicle = state.fleet.focus(None, session.vehicle_id.as_deref()).cloned();
    Json(BookingResponse { session, vehicle })
}

// ============================================================================
// Handlers
// ============================================================================

async fn current_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<RiderClaims>,
) -> Json<BookingResponse> {
    let snapshot = state.sessions.with_session(&claims.sub, |session| session.snapshot());
    respond(&state, snapshot)
}

async fn start_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<RiderClaims>,
    Json(req): Json<StartBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let snapshot = state
        .sessions
        .with_session(&claims.sub, |session| session.start_booking(&req.vehicle_id))?;
    Ok(respond(&state, snapshot))
}

async fn verify_code(
    State(state): State<AppState>,
    Extension(claims): Extension<RiderClaims>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let snapshot = state
        .sessions
        .with_session(&claims.sub, |session| session.submit_code(&req.code))?;
    Ok(respond(&state, snapshot))
}

async fn end_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<RiderClaims>,
) -> Json<CloseResponse> {
    let (closed, session) = state
        .sessions
        .with_session(&claims.sub, |session| (session.end_trip(), session.snapshot()));
    Json(CloseResponse { closed, session })
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<RiderClaims>,
) -> Json<CloseResponse> {
    let (closed, session) = state
        .sessions
        .with_session(&claims.sub, |session| (session.cancel(), session.snapshot()));
    Json(CloseResponse { closed, session })
}

/// Phase changes for the caller's session as server-sent events.
async fn stream_events(
    State(state): State<AppState>,
    Extension(claims): Extension<RiderClaims>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.sessions.session_for(&claims.sub);
    let rx = session.subscribe();

    // The stream owns a handle so the registry keeps the session while it is open.
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let _held = &session;
        async move {
            match result {
                Ok(event) => match Event::default().event("phase_changed").json_data(&event) {
                    Ok(sse) => Some(Ok(sse)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to encode phase event");
                        None
                    }
                },
                // Lagged receivers skip ahead; the next event carries current state.
                Err(_) => None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
