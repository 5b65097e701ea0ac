//! # Kade Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  startup                                                                │
//! │                                                                         │
//! │  init_tracing ──► ServerConfig::load ──► Database::new (+ migrations)   │
//! │       ──► seed_sample_data (empty catalog only) ──► JwtManager          │
//! │       ──► axum::serve ... shutdown_signal ──► Database::close           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kade_db::{Database, DbConfig};
use kade_server::auth::{hash_password, JwtManager};
use kade_server::{build_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::load().context("loading configuration")?;
    let db_path = config.database.resolved_path();
    info!(
        address = %config.bind_address(),
        database = %db_path.display(),
        stock_policy = %config.policy.stock,
        loyalty_policy = %config.policy.loyalty,
        "Configuration loaded"
    );

    let db_config = DbConfig::new(db_path)
        .max_connections(config.database.max_connections)
        .policies(config.policy);
    let db = Database::new(db_config).await.context("opening database")?;

    if config.seed.enabled {
        let admin_hash = hash_password(&config.seed.admin_password)?;
        if db
            .seed_sample_data(&config.seed.admin_username, &admin_hash)
            .await
            .context("seeding sample data")?
        {
            info!(admin = %config.seed.admin_username, "Seeded sample catalog");
        }
    }

    let jwt = JwtManager::from_config(&config.auth);
    let address = config.bind_address();
    let state = AppState::new(db.clone(), jwt, config);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "Kade POS server listening, API at /api");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kade=trace` - Show trace for kade crates only
/// - Default: `info,kade=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kade=debug,sqlx=warn,tower_http=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
