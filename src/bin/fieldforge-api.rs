/// fieldforge API - HTTP wrapper over model definitions, extension fields and LOVs
///
/// Security scope comes from request headers set by the upstream gateway.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use fieldforge::{Engine, EngineConfig};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let engine = match load_engine() {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    let app = fieldforge::api::router(Arc::new(engine));

    let port: u16 = match std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse() {
        Ok(port) => port,
        Err(e) => {
            tracing::error!("Invalid PORT: {}", e);
            std::process::exit(1);
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("fieldforge API listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load the engine and build every model so configuration errors stop startup.
fn load_engine() -> fieldforge::Result<Engine> {
    let path = PathBuf::from(
        std::env::var("FIELDFORGE_CONFIG").unwrap_or_else(|_| "fieldforge.yaml".to_string()),
    );

    let config = if path.exists() {
        EngineConfig::from_file(&path)?
    } else {
        tracing::info!("{} not found, using defaults", path.display());
        EngineConfig::default()
    };

    let engine = Engine::from_config(config.with_env_overrides()?)?;
    let models = engine.check()?;
    tracing::info!("Built {} model definitions", models);

    Ok(engine)
}
