//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::services::Claims;
use common::AppError;
use domain::BEARER_TOKEN_PREFIX;

/// Authenticated user extracted from an access token
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
        }
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
}

/// JWT authentication middleware.
///
/// Extracts and validates the access token from the Authorization header,
/// then injects the CurrentUser into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AppError::Unauthorized)?;
    let claims = state.auth_service.verify_access_token(token)?;

    request.extensions_mut().insert(CurrentUser::from(claims));

    Ok(next.run(request).await)
}

/// Like [`auth_middleware`], but lets anonymous requests through.
///
/// A valid access token still yields a CurrentUser; any other bearer token
/// (a refresh token, say) leaves the request anonymous.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let current_user = bearer_token(&request).and_then(|token| {
        state
            .auth_service
            .verify_access_token(token)
            .map_err(|e| tracing::debug!(error = %e, "Bearer token is not an access token"))
            .ok()
    });

    if let Some(claims) = current_user {
        request.extensions_mut().insert(CurrentUser::from(claims));
    }

    next.run(request).await
}
