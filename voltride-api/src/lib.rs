use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod app_config;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod sessions;
pub mod state;
pub mod vehicles;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let rider_routes = Router::new()
        .merge(vehicles::routes())
        .merge(bookings::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rider_auth_middleware,
        ));

    Router::new()
        .merge(auth::routes())
        .merge(rider_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
