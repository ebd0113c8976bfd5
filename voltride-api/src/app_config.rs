use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use voltride_core::SessionConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: SessionConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FleetConfig {
    /// JSON array of vehicle records. The demo fleet is used when unset or unreadable.
    pub inventory_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment and local overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. VOLTRIDE__BOOKING__CODE_POLICY=fixed
            .add_source(config::Environment::with_prefix("VOLTRIDE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
