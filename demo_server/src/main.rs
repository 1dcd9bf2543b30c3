//! Demo server: serves descriptors and records over HTTP.
//!
//! Run from repo root: `cargo run -p demo-server`
//! Reads `DATABASE_URL` and the `METATABLE_*` variables (a `.env` file is honoured).

use metatable_sdk::{
    common_routes_with_ready, ensure_database_exists, ensure_metadata_tables, record_routes, AppState, Database,
    Engine, EngineConfig,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("metatable_sdk=info")),
        )
        .init();

    let config = EngineConfig::from_env()?;
    ensure_database_exists(&config.database_url).await?;
    let db = Database::connect(config).await?;
    ensure_metadata_tables(&db).await?;

    let state = AppState::new(Engine::new(db));
    let app = common_routes_with_ready(state.clone()).merge(record_routes(state));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("demo server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
