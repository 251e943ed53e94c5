use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;
use std::time::Duration;

use payguard::config::Config;
use payguard::coordination::SqliteCoordinationStore;
use payguard::crypto::WebhookSecret;
use payguard::db::{create_pool, init_coordination_db, init_db, AppState};
use payguard::handlers;
use payguard::idempotency::IdempotencyGuard;
use payguard::processor::PaymentProcessor;
use payguard::records::SqliteRecordStore;

#[derive(Parser, Debug)]
#[command(name = "payguard")]
#[command(about = "Exactly-once payment webhook processor")]
struct Cli {
    /// Delete databases on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Spawns a background task that periodically deletes expired locks and markers.
/// Expired rows are already ignored by every read; this only reclaims space.
fn spawn_cleanup_task(store: SqliteCoordinationStore, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let store = store.clone();
            match tokio::task::spawn_blocking(move || store.purge_expired()).await {
                Ok(Ok(count)) => {
                    if count > 0 {
                        tracing::debug!("Purged {} expired coordination keys", count);
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!("Failed to purge coordination keys: {}", e);
                }
                Err(e) => {
                    tracing::warn!("Coordination purge task failed: {}", e);
                }
            }
        }
    });

    tracing::info!(
        "Background cleanup task started (runs every {}s)",
        interval.as_secs()
    );
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payguard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::error!("FATAL: {}", e);
        std::process::exit(1);
    });

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let coordination_pool = create_pool(&config.coordination_database_path)
        .expect("Failed to create coordination database pool");

    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = coordination_pool
            .get()
            .expect("Failed to get coordination connection");
        init_coordination_db(&conn).expect("Failed to initialize coordination database");
    }

    let coordination = SqliteCoordinationStore::new(coordination_pool);
    let guard = IdempotencyGuard::with_ttls(
        Arc::new(coordination.clone()),
        config.lock_ttl,
        config.processed_ttl,
    );
    let processor = PaymentProcessor::new(guard, Arc::new(SqliteRecordStore::new(db_pool)));

    let state = AppState {
        processor: Arc::new(processor),
        webhook_secret: WebhookSecret::new(config.webhook_secret.clone()),
    };

    spawn_cleanup_task(coordination, config.coordination_purge_interval);

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    if cli.ephemeral && !config.dev_mode {
        tracing::warn!("--ephemeral ignored: not in dev mode (set PAYGUARD_ENV=dev)");
    }
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: databases will be deleted on exit");
    }

    tracing::info!(
        "Payguard listening on {} (lock TTL {}ms, marker TTL {}s)",
        addr,
        config.lock_ttl.as_millis(),
        config.processed_ttl.as_secs()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral databases...");
        for path in [&config.database_path, &config.coordination_database_path] {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove {}: {}", path, e);
            } else {
                tracing::info!("Removed {}", path);
            }
            let _ = std::fs::remove_file(format!("{}-wal", path));
            let _ = std::fs::remove_file(format!("{}-shm", path));
        }
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
