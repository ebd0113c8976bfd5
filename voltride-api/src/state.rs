use std::sync::Arc;
use voltride_catalog::Fleet;

use crate::sessions::SessionRegistry;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub fleet: Arc<Fleet>,
    pub sessions: Arc<SessionRegistry>,
    pub auth: AuthConfig,
}
