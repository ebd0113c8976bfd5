use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use voltride_core::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    InternalServerError(String),
    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFoundError(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            AppError::Booking(err) => match err {
                BookingError::UnknownVehicle(_) => (StatusCode::NOT_FOUND, "unknown_vehicle"),
                BookingError::CodeMismatch { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "code_mismatch")
                }
                BookingError::NoActiveSession => (StatusCode::CONFLICT, "no_active_session"),
                BookingError::AttemptsExhausted => {
                    (StatusCode::TOO_MANY_REQUESTS, "attempts_exhausted")
                }
                BookingError::ClockFault(_) => (StatusCode::INTERNAL_SERVER_ERROR, "clock_fault"),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal Server Error: {}", self);
            if matches!(self, AppError::Booking(BookingError::ClockFault(_))) {
                "The trip timer failed; the booking was closed".to_string()
            } else {
                "Internal Server Error".to_string()
            }
        } else {
            self.to_string()
        };

        let mut body = json!({
            "error": message,
            "code": kind,
        });
        if let AppError::Booking(BookingError::CodeMismatch { attempts_remaining: Some(left) }) = &self {
            body["attempts_remaining"] = json!(left);
        }

        (status, Json(body)).into_response()
    }
}
