use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voltride_api::{app, sessions::SessionRegistry, state::{AppState, AuthConfig}};
use voltride_catalog::Fleet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voltride_api=debug,voltride_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = voltride_api::app_config::Config::load()?;
    tracing::info!("Starting Voltride API on port {}", config.server.port);

    let fleet = Arc::new(Fleet::load_or_demo(config.fleet.inventory_path.as_deref()));
    let sessions = Arc::new(SessionRegistry::new(config.booking.clone(), fleet.clone()));

    let app_state = AppState {
        fleet,
        sessions,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
