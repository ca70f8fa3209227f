//! Application route configuration.

use axum::{extract::State, http::StatusCode, middleware, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    article_routes, auth_routes, protected_article_routes, protected_user_routes, user_routes,
};
use super::graphql::{build_schema, graphql_routes};
use super::middleware::{auth_middleware, optional_auth_middleware};
use super::openapi::ApiDoc;
use super::AppState;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let require_token = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/auth", auth_routes())
        .nest(
            "/users",
            user_routes().merge(protected_user_routes().route_layer(require_token())),
        )
        .nest(
            "/articles",
            article_routes().merge(protected_article_routes().route_layer(require_token())),
        )
        .merge(graphql_routes(build_schema(state.clone())).route_layer(
            middleware::from_fn_with_state(state.clone(), optional_auth_middleware),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
}

#[derive(Serialize)]
struct ServiceHealth {
    database: ServiceStatus,
    article_cache: ServiceStatus,
    token_cache: ServiceStatus,
}

#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServiceStatus {
    fn healthy(&self) -> bool {
        self.error.is_none()
    }
}

impl From<Result<(), String>> for ServiceStatus {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => ServiceStatus {
                status: "healthy",
                error: None,
            },
            Err(e) => ServiceStatus {
                status: "unhealthy",
                error: Some(e),
            },
        }
    }
}

/// Health check endpoint pinging every store
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let services = ServiceHealth {
        database: state.health.database().await.into(),
        article_cache: state.health.article_cache().await.into(),
        token_cache: state.health.token_cache().await.into(),
    };

    let all_healthy = services.database.healthy()
        && services.article_cache.healthy()
        && services.token_cache.healthy();

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if all_healthy { "healthy" } else { "degraded" },
            services,
        }),
    )
}
