//! Authentication handlers.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, routing::post, Router};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use common::{AppError, AppResult};
use domain::TokenPair;

/// Letters, digits and underscores
pub static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").unwrap_or_else(|e| panic!("invalid username pattern: {e}"))
});

/// Sign-up request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    /// 3-20 letters, digits or underscores
    #[validate(
        length(min = 3, max = 20, message = "Name must be 3-20 characters"),
        regex(path = *USERNAME_REGEX, message = "Name may only contain letters, digits and underscores")
    )]
    #[schema(example = "alice_01", min_length = 3, max_length = 20)]
    pub name: String,
    #[validate(length(min = 5, max = 20, message = "Password must be 5-20 characters"))]
    #[schema(example = "s3cret", min_length = 5, max_length = 20)]
    pub password: String,
}

/// Sign-in request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(length(min = 3, max = 20, message = "Name must be 3-20 characters"))]
    #[schema(example = "alice_01")]
    pub name: String,
    #[validate(length(min = 5, max = 20, message = "Password must be 5-20 characters"))]
    #[schema(example = "s3cret")]
    pub password: String,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/refresh-tokens", get(refresh_tokens))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/sign-up",
    tag = "Authentication",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User registered", body = TokenPair),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<TokenPair>)> {
    let tokens = state
        .auth_service
        .sign_up(payload.name, payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

/// Sign in and get a token pair
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "Authentication",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenPair),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignInRequest>,
) -> AppResult<Json<TokenPair>> {
    let tokens = state
        .auth_service
        .sign_in(payload.name, payload.password)
        .await?;

    Ok(Json(tokens))
}

/// Exchange the refresh token for a new pair
#[utoipa::path(
    get,
    path = "/auth/refresh-tokens",
    tag = "Authentication",
    responses(
        (status = 200, description = "Tokens rotated", body = TokenPair),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn refresh_tokens(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> AppResult<Json<TokenPair>> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;

    let tokens = state
        .auth_service
        .refresh_tokens(bearer.token().to_string())
        .await?;

    Ok(Json(tokens))
}
