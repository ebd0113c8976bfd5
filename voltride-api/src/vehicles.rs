use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use voltride_shared::Vehicle;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct VehicleQuery {
    pub q: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/vehicles", get(list_vehicles))
        .route("/v1/vehicles/{id}", get(get_vehicle))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleQuery>,
) -> Json<Vec<Vehicle>> {
    let term = query.q.unwrap_or_default();
    Json(state.fleet.search(&term).into_iter().cloned().collect())
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vehicle>, AppError> {
    state
        .fleet
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Vehicle not found: {}", id)))
}
