//! Integration tests for API endpoints.
//!
//! These tests use stub services to exercise routing, authentication,
//! validation and error mapping without PostgreSQL or Redis.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use articles_service_lib::api::{create_router, AppState};
use articles_service_lib::infra::StoreHealth;
use articles_service_lib::services::{ArticleService, AuthService, Claims, UserService};
use common::{AppError, AppResult};
use domain::{Article, ArticleChanges, TokenPair, TokenType, Topic, User};

const ACCESS_TOKEN: &str = "valid-access-token";
const REFRESH_TOKEN: &str = "valid-refresh-token";

fn author_id() -> Uuid {
    Uuid::from_u128(0xA11CE)
}

fn known_article_id() -> Uuid {
    Uuid::from_u128(0xB00C)
}

fn token_pair() -> TokenPair {
    TokenPair {
        access_token: ACCESS_TOKEN.to_string(),
        refresh_token: REFRESH_TOKEN.to_string(),
    }
}

fn user(id: Uuid) -> User {
    User {
        id,
        name: "alice".to_string(),
        password_hash: "hashed".to_string(),
        registration_date: Utc::now(),
    }
}

fn article(id: Uuid) -> Article {
    let mut article = Article::new(
        &user(author_id()),
        &Topic::new(domain::TOPIC_TECH_ID, "Tech"),
        "body".to_string(),
    );
    article.id = id;
    article
}

// =============================================================================
// Stub Services
// =============================================================================

struct StubAuthService;

#[async_trait]
impl AuthService for StubAuthService {
    async fn sign_up(&self, _name: String, _password: String) -> AppResult<TokenPair> {
        Ok(token_pair())
    }

    async fn sign_in(&self, _name: String, password: String) -> AppResult<TokenPair> {
        if password == "secret1" {
            Ok(token_pair())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }

    async fn refresh_tokens(&self, refresh_token: String) -> AppResult<TokenPair> {
        if refresh_token == REFRESH_TOKEN {
            Ok(token_pair())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        if token != ACCESS_TOKEN {
            return Err(AppError::Unauthorized);
        }
        Ok(Claims {
            sub: author_id(),
            name: "alice".to_string(),
            token_type: TokenType::Access,
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4(),
        })
    }
}

struct StubUserService;

#[async_trait]
impl UserService for StubUserService {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        Ok(user(id))
    }
}

struct StubArticleService;

#[async_trait]
impl ArticleService for StubArticleService {
    async fn create_article(
        &self,
        _author_id: Uuid,
        topic_id: Uuid,
        text: String,
    ) -> AppResult<Article> {
        let mut created = article(Uuid::new_v4());
        created.topic_id = topic_id;
        created.text = text;
        Ok(created)
    }

    async fn retrieve_article(&self, id: Uuid) -> AppResult<Article> {
        if id == known_article_id() {
            Ok(article(id))
        } else {
            Err(AppError::not_found("Article"))
        }
    }

    async fn update_article(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: ArticleChanges,
    ) -> AppResult<Article> {
        if user_id != author_id() {
            return Err(AppError::Forbidden);
        }
        let mut updated = article(id);
        if let Some(text) = changes.text {
            updated.text = text;
        }
        Ok(updated)
    }

    async fn delete_article(&self, _user_id: Uuid, id: Uuid) -> AppResult<()> {
        if id == known_article_id() {
            Ok(())
        } else {
            Err(AppError::not_found("Article"))
        }
    }

    async fn update_popular_articles(
        &self,
        _date_from: DateTime<Utc>,
        _count: u64,
    ) -> AppResult<usize> {
        Ok(0)
    }

    async fn retrieve_popular_articles(&self) -> AppResult<Vec<Article>> {
        Ok(vec![article(known_article_id())])
    }
}

struct StubHealth {
    token_cache_up: bool,
}

#[async_trait]
impl StoreHealth for StubHealth {
    async fn database(&self) -> Result<(), String> {
        Ok(())
    }

    async fn article_cache(&self) -> Result<(), String> {
        Ok(())
    }

    async fn token_cache(&self) -> Result<(), String> {
        if self.token_cache_up {
            Ok(())
        } else {
            Err("connection refused".to_string())
        }
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

fn app_with_health(token_cache_up: bool) -> Router {
    create_router(AppState::new(
        Arc::new(StubAuthService),
        Arc::new(StubUserService),
        Arc::new(StubArticleService),
        Arc::new(StubHealth { token_cache_up }),
    ))
}

fn app() -> Router {
    app_with_health(true)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_every_store() {
    let (status, body) = send(app(), get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["token_cache"]["status"], "healthy");
}

#[tokio::test]
async fn test_health_degraded_when_a_store_is_down() {
    let (status, body) = send(app_with_health(false), get("/health", None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["token_cache"]["error"], "connection refused");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, body) = send(app(), get("/api-docs/openapi.json", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/articles/popular"].is_object());
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_sign_up_returns_token_pair() {
    let request = with_json(
        Method::POST,
        "/auth/sign-up",
        None,
        json!({"name": "alice_01", "password": "secret1"}),
    );

    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["access_token"], ACCESS_TOKEN);
    assert_eq!(body["refresh_token"], REFRESH_TOKEN);
}

#[tokio::test]
async fn test_sign_up_rejects_invalid_name() {
    let request = with_json(
        Method::POST,
        "/auth/sign-up",
        None,
        json!({"name": "no spaces!", "password": "secret1"}),
    );

    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_sign_in_with_wrong_password() {
    let request = with_json(
        Method::POST,
        "/auth/sign-in",
        None,
        json!({"name": "alice", "password": "wrong12"}),
    );

    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_refresh_tokens_needs_bearer_refresh_token() {
    let (missing, _) = send(app(), get("/auth/refresh-tokens", None)).await;
    let (stale, _) = send(app(), get("/auth/refresh-tokens", Some("stale"))).await;
    let (status, body) = send(app(), get("/auth/refresh-tokens", Some(REFRESH_TOKEN))).await;

    assert_eq!(missing, StatusCode::UNAUTHORIZED);
    assert_eq!(stale, StatusCode::UNAUTHORIZED);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], ACCESS_TOKEN);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_me_requires_access_token() {
    let (anonymous, _) = send(app(), get("/users/me", None)).await;
    let (forged, _) = send(app(), get("/users/me", Some("forged"))).await;
    let (status, body) = send(app(), get("/users/me", Some(ACCESS_TOKEN))).await;

    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
    assert_eq!(forged, StatusCode::UNAUTHORIZED);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], author_id().to_string());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_user_lookup_is_public() {
    let id = Uuid::new_v4();

    let (status, body) = send(app(), get(&format!("/users/{id}"), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.to_string());
}

// =============================================================================
// Articles
// =============================================================================

#[tokio::test]
async fn test_popular_articles_are_public() {
    let (status, body) = send(app(), get("/articles/popular", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_create_article_requires_token() {
    let payload = json!({"topic_id": domain::TOPIC_NEWS_ID, "text": "hello"});

    let (anonymous, _) = send(
        app(),
        with_json(Method::POST, "/articles/create", None, payload.clone()),
    )
    .await;
    let (status, body) = send(
        app(),
        with_json(Method::POST, "/articles/create", Some(ACCESS_TOKEN), payload),
    )
    .await;

    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["text"], "hello");
    assert_eq!(body["topic_id"], domain::TOPIC_NEWS_ID.to_string());
}

#[tokio::test]
async fn test_create_article_rejects_oversized_text() {
    let payload = json!({"topic_id": domain::TOPIC_NEWS_ID, "text": "x".repeat(10_001)});

    let (status, _) = send(
        app(),
        with_json(Method::POST, "/articles/create", Some(ACCESS_TOKEN), payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_article_is_not_found() {
    let (status, body) = send(app(), get(&format!("/articles/{}", Uuid::new_v4()), None)).await;
    let (found, _) = send(app(), get(&format!("/articles/{}", known_article_id()), None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(found, StatusCode::OK);
}

#[tokio::test]
async fn test_update_article_returns_edited_article() {
    let request = with_json(
        Method::PATCH,
        "/articles/update",
        Some(ACCESS_TOKEN),
        json!({"id": known_article_id(), "text": "edited"}),
    );

    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "edited");
}

#[tokio::test]
async fn test_delete_article_by_query() {
    let uri = format!("/articles/delete?id={}", known_article_id());
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ACCESS_TOKEN}"))
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(app(), request).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

// =============================================================================
// GraphQL
// =============================================================================

fn graphql(query: &str, token: Option<&str>) -> Request<Body> {
    with_json(Method::POST, "/graphql", token, json!({ "query": query }))
}

#[tokio::test]
async fn test_graphql_article_query_is_public() {
    let query = format!(
        r#"{{ getArticleById(articleId: "{}") {{ id text user {{ name }} topic {{ name }} }} }}"#,
        known_article_id()
    );

    let (status, body) = send(app(), graphql(&query, None)).await;

    assert_eq!(status, StatusCode::OK);
    let article = &body["data"]["getArticleById"];
    assert_eq!(article["id"], known_article_id().to_string());
    assert_eq!(article["user"]["name"], "alice");
    assert_eq!(article["topic"]["name"], "Tech");
}

#[tokio::test]
async fn test_graphql_unknown_article_reports_not_found_code() {
    let query = format!(r#"{{ getArticleById(articleId: "{}") {{ id }} }}"#, Uuid::new_v4());

    let (status, body) = send(app(), graphql(&query, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errors"][0]["extensions"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_graphql_create_article_needs_access_token() {
    let mutation = format!(
        r#"mutation {{ createArticle(articleInfo: {{topicId: "{}", text: "hello"}}) {{ text topic {{ id }} }} }}"#,
        domain::TOPIC_NEWS_ID
    );

    let (_, anonymous) = send(app(), graphql(&mutation, None)).await;
    let (status, body) = send(app(), graphql(&mutation, Some(ACCESS_TOKEN))).await;

    assert_eq!(anonymous["errors"][0]["extensions"]["code"], "UNAUTHORIZED");
    assert_eq!(status, StatusCode::OK);
    assert!(body["errors"].is_null());
    assert_eq!(body["data"]["createArticle"]["text"], "hello");
    assert_eq!(
        body["data"]["createArticle"]["topic"]["id"],
        domain::TOPIC_NEWS_ID.to_string()
    );
}

#[tokio::test]
async fn test_graphql_sign_up_applies_name_rules() {
    let mutation =
        r#"mutation { signUp(userInitData: {name: "no spaces!", password: "secret1"}) { accessToken } }"#;

    let (_, body) = send(app(), graphql(mutation, None)).await;

    assert_eq!(body["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_graphql_refresh_uses_bearer_refresh_token() {
    let mutation = "mutation { refreshTokens { accessToken refreshToken } }";

    let (_, missing) = send(app(), graphql(mutation, None)).await;
    let (_, body) = send(app(), graphql(mutation, Some(REFRESH_TOKEN))).await;

    assert_eq!(missing["errors"][0]["extensions"]["code"], "UNAUTHORIZED");
    assert_eq!(body["data"]["refreshTokens"]["accessToken"], ACCESS_TOKEN);
}

#[tokio::test]
async fn test_graphql_my_user_data_follows_access_token() {
    let query = "{ getMyUserData { id name } }";

    let (_, anonymous) = send(app(), graphql(query, None)).await;
    let (_, body) = send(app(), graphql(query, Some(ACCESS_TOKEN))).await;

    assert_eq!(anonymous["errors"][0]["extensions"]["code"], "UNAUTHORIZED");
    assert_eq!(body["data"]["getMyUserData"]["id"], author_id().to_string());
}
