use anyhow::Result;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

use skillswap::api::{router, ApiState};
use skillswap::directory::UserDirectory;
use skillswap::store::{DatabasePool, MemoryDirectory, MemorySwapStore, SwapStore};
use skillswap::swap::LifecycleEngine;
use skillswap::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;

    init_logging(&config)?;

    info!("Starting SkillSwap server");

    // Pick the storage backend.
    let (swaps, users): (Arc<dyn SwapStore>, Arc<dyn UserDirectory>) =
        if config.database.postgres_enabled {
            let pool = DatabasePool::new(&config.database.postgres_url)
                .await
                .map_err(|e| anyhow::anyhow!("database: {}", e))?;
            pool.init_schema()
                .await
                .map_err(|e| anyhow::anyhow!("schema: {}", e))?;
            (Arc::new(pool.swap_store()), Arc::new(pool.user_directory()))
        } else {
            info!("PostgreSQL disabled, using in-memory stores");
            (
                Arc::new(MemorySwapStore::new()),
                Arc::new(MemoryDirectory::new()),
            )
        };

    let engine = Arc::new(LifecycleEngine::new(swaps.clone(), users.clone()));
    let state = ApiState {
        engine,
        users,
        swaps,
    };

    let mut app = router(state);
    if config.logging.log_requests {
        app = app.layer(TraceLayer::new_for_http());
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("SkillSwap server listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
