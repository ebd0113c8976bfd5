pub mod auth;

pub use auth::{rider_auth_middleware, RiderClaims, RIDER_ROLE};
