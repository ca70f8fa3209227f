//! Serve command - Starts the HTTP server and the popular-articles job.

use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::infra::{Cache, Database, PgStoreContext};
use crate::scheduler::PopularArticlesJob;
use crate::services::{ServiceContainer, Services};
use common::{AppError, AppResult};

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!(app = %config.server.app_name, "Starting server...");

    let database = Database::connect(&config.database).await?;
    tracing::info!("Database connected");

    let article_cache = Cache::connect(&config.cache.article_url).await?;
    let tokens = Cache::connect(&config.cache.token_url).await?;
    tracing::info!("Redis connected");

    let context = Arc::new(PgStoreContext::new(database, article_cache, tokens));
    let services = Services::from_context(context.clone(), config.jwt.clone());

    let job = PopularArticlesJob::new(services.articles(), config.popular_articles.clone())
        .spawn();

    let app = create_router(AppState::from_container(&services, context));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    job.abort();
    tracing::info!("Server stopped");

    served.map_err(|e| AppError::internal(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
