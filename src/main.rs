use std::sync::Arc;

use bookshop::config::{Cli, Config};
use bookshop::db::Database;
use bookshop::handler::AppState;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("bookshop.svc starting");

    let loaded = Config::resolve(&args).unwrap_or_else(|e| {
        tracing::error!(error = %format!("{e:#}"), "failed to load config");
        std::process::exit(1);
    });
    let cfg = loaded.config;

    if let Err(e) = std::fs::create_dir_all(&loaded.data_dir) {
        tracing::error!(error = %e, path = ?loaded.data_dir, "failed to create data directory");
        std::process::exit(1);
    }

    let db_path = cfg.app.database_path(&loaded.data_dir);
    let db = Arc::new(Database::open(&db_path).await.unwrap_or_else(|e| {
        tracing::error!(error = %format!("{e:#}"), path = ?db_path, "failed to setup database");
        std::process::exit(1);
    }));
    tracing::info!(
        database = %cfg.app.get_db(),
        port = cfg.app.get_port(),
        "bookshop.svc store ready"
    );

    let app = bookshop::router(AppState { db }, cfg.app.max_upload_bytes);

    let address = cfg.app.get_address();
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, address = %address, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("bookshop.svc running on {}", &address);
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server stopped unexpectedly");
        std::process::exit(1);
    }

    tracing::info!("bookshop.svc going off, graceful shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }
    tracing::info!("ctrl+c signal received, preparing to shutdown");
}
