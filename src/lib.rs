// src/lib.rs
//! REST backend for polls: categorised questions with a list of answer
//! options, stored in Postgres.
//!
//! # Routes
//! - `GET /categories/`, `POST /categories/create`, `PUT|PATCH /categories/{id}/update`
//! - `GET /questions`, `POST /questions/create`
//! - `GET /questions/{id}`, `PUT|PATCH /questions/{id}/update`, `DELETE /questions/{id}/delete`
//! - `GET /health`
//!
//! # Setup
//! ```sh
//! export DATABASE_URL=postgres://postgres@localhost/polls
//! cargo run
//! ```
//! Migrations under `migrations/` run on startup unless `RUN_MIGRATIONS=false`.
use std::time::Duration;

use axum_server::Handle;
use sqlx::PgPool;
use tokio::signal;
use tracing::info;

pub mod category;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod poll;
pub mod routes;
pub mod schemas;
pub mod validation;

use config::Config;
use error::StartupError;

/// State shared by every handler.
pub struct AppState {
    pub pool: PgPool,
}

pub async fn serve(config: Config) -> Result<(), StartupError> {
    info!("Connecting to the database...");
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;

    if config.run_migrations {
        info!("Running migrations...");
        db::run_migrations(&pool).await?;
    }

    let app = routes::create_routes(pool);
    let address = config.bind_addr();

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    info!("Server running on {address}");
    axum_server::bind(address)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
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

    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
