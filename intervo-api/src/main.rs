//! intervo-api - Interview Session Server
//!
//! Hosts the REST surface, the interview WebSocket gateway, and the
//! orchestrator that drives live mock-interview sessions.

use anyhow::Result;
use intervo_api::clients::{HttpAiGateway, HttpSttTokenIssuer, HttpTtsService, FsObjectStorage};
use intervo_api::config::Config;
use intervo_api::orchestrator::Orchestrator;
use intervo_api::rooms::{LocalBus, RoomRegistry};
use intervo_api::AppState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting intervo-api (Interview Session Server)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Listening address: {}", config.bind_addr);
    info!("Database: {}", config.database_path.display());

    let db_pool = intervo_api::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    // Setup pipelines die with the process; fail anything still PENDING
    let failed = intervo_api::db::sessions::fail_stale_pending(&db_pool).await?;
    if failed > 0 {
        warn!("Marked {} stale PENDING session(s) as FAILED", failed);
    }

    let rooms = RoomRegistry::new(Arc::new(LocalBus::default()));
    let orchestrator = Arc::new(Orchestrator::new(
        db_pool,
        Arc::new(HttpAiGateway::new(
            config.ai_base_url.clone(),
            Some(Duration::from_secs(config.ai_timeout_secs)),
        )),
        Arc::new(FsObjectStorage::new(
            config.storage_dir.clone(),
            config.public_base_url.clone(),
        )),
        Arc::new(HttpTtsService::new(config.tts_base_url.clone())),
        Arc::new(HttpSttTokenIssuer::new(
            config.stt_token_url.clone(),
            config.stt_api_key.clone(),
        )),
        rooms.clone(),
    ));

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        rooms,
        orchestrator,
    };
    let app = intervo_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/healthz", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
