//! Article handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, patch, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use common::AppResult;
use domain::{Article, ArticleChanges};

/// New article
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateArticleRequest {
    pub topic_id: Uuid,
    #[validate(length(min = 1, max = 10000, message = "Text must be 1-10000 characters"))]
    #[schema(example = "Rust 1.80 is out", max_length = 10000)]
    pub text: String,
}

/// Article edit. Omitted fields keep their value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateArticleRequest {
    pub id: Uuid,
    pub topic_id: Option<Uuid>,
    #[validate(length(min = 1, max = 10000, message = "Text must be 1-10000 characters"))]
    pub text: Option<String>,
}

impl From<UpdateArticleRequest> for ArticleChanges {
    fn from(request: UpdateArticleRequest) -> Self {
        Self {
            topic_id: request.topic_id,
            text: request.text,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteArticleQuery {
    /// Article ID
    pub id: Uuid,
}

/// Routes open to anonymous callers
pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/popular", get(popular_articles))
        .route("/:id", get(get_article))
}

/// Routes that need an access token
pub fn protected_article_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_article))
        .route("/update", patch(update_article))
        .route("/delete", delete(delete_article))
}

/// Publish an article
#[utoipa::path(
    post,
    path = "/articles/create",
    tag = "Articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article created", body = Article),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "Topic not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_article(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateArticleRequest>,
) -> AppResult<(StatusCode, Json<Article>)> {
    let article = state
        .article_service
        .create_article(current_user.id, payload.topic_id, payload.text)
        .await?;

    Ok((StatusCode::CREATED, Json(article)))
}

/// Cached popular articles
#[utoipa::path(
    get,
    path = "/articles/popular",
    tag = "Articles",
    responses((status = 200, description = "Most viewed recent articles", body = [Article]))
)]
pub async fn popular_articles(State(state): State<AppState>) -> AppResult<Json<Vec<Article>>> {
    let articles = state.article_service.retrieve_popular_articles().await?;
    Ok(Json(articles))
}

/// Read an article. Counts as a view.
#[utoipa::path(
    get,
    path = "/articles/{id}",
    tag = "Articles",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article found", body = Article),
        (status = 404, description = "Article not found")
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Article>> {
    let article = state.article_service.retrieve_article(id).await?;
    Ok(Json(article))
}

/// Edit an article
#[utoipa::path(
    patch,
    path = "/articles/update",
    tag = "Articles",
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = Article),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Article or topic not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_article(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateArticleRequest>,
) -> AppResult<Json<Article>> {
    let id = payload.id;
    let article = state
        .article_service
        .update_article(current_user.id, id, payload.into())
        .await?;

    Ok(Json(article))
}

/// Delete an article
#[utoipa::path(
    delete,
    path = "/articles/delete",
    tag = "Articles",
    params(DeleteArticleQuery),
    responses(
        (status = 204, description = "Article deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Article not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_article(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<DeleteArticleQuery>,
) -> AppResult<StatusCode> {
    state
        .article_service
        .delete_article(current_user.id, query.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
