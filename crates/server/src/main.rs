use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipfetch_core::{
    load_config, validate_config, MediaBackend, Orchestrator, Platform, YtDlpBackend,
};
use clipfetch_server::{api::create_router, state::AppState, sweeper::Sweeper};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CLIPFETCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "clipfetch {} starting (config {})",
        VERSION,
        &config_hash[..16]
    );
    info!("Temp root: {:?}", config.retrieval.temp_root);
    info!(
        "Budget: {} bytes, {}s per attempt, {}s overall",
        config.retrieval.max_bytes,
        config.retrieval.per_attempt_timeout_secs,
        config.retrieval.overall_timeout_secs
    );

    // The service still starts without a working backend; every attempt then
    // fails as a backend error.
    let backend = Arc::new(YtDlpBackend::new(config.backend.clone()));
    match backend.validate().await {
        Ok(()) => info!("Using backend: {}", backend.name()),
        Err(e) => warn!("Backend {} is not usable: {}", backend.name(), e),
    }

    let orchestrator = Arc::new(
        Orchestrator::from_config(&config, backend).context("Failed to build orchestrator")?,
    );
    for platform in Platform::SUPPORTED {
        let names: Vec<&str> = orchestrator
            .strategies_for(platform)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        info!("Strategies for {}: {}", platform, names.join(", "));
    }

    let shutdown = CancellationToken::new();

    // Periodic stale artifact sweep
    let sweeper_handle = if config.janitor.enabled {
        let sweeper = Sweeper::new(
            Arc::clone(&orchestrator),
            config.janitor.sweep_interval(),
            config.janitor.max_age(),
        );
        Some(tokio::spawn(sweeper.run(shutdown.clone())))
    } else {
        info!("Artifact sweeper disabled in config");
        None
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&orchestrator),
        shutdown.clone(),
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Abort in-flight retrievals so their scopes are released.
            token.cancel();
        })
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    shutdown.cancel();
    if let Some(handle) = sweeper_handle {
        let _ = handle.await;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
