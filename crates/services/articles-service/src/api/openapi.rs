//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{article_handler, auth_handler, user_handler};
use domain::{Article, TokenPair, UserResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Articles aggregator",
        version = "0.1.0",
        description = "Articles with authors, topics and a popular-articles cache"
    ),
    servers((url = "http://localhost:7777", description = "Local development server")),
    paths(
        auth_handler::sign_up,
        auth_handler::sign_in,
        auth_handler::refresh_tokens,
        user_handler::get_current_user,
        user_handler::get_user,
        article_handler::create_article,
        article_handler::popular_articles,
        article_handler::get_article,
        article_handler::update_article,
        article_handler::delete_article,
    ),
    components(schemas(
        Article,
        TokenPair,
        UserResponse,
        auth_handler::SignUpRequest,
        auth_handler::SignInRequest,
        article_handler::CreateArticleRequest,
        article_handler::UpdateArticleRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sign-up, sign-in and token refresh"),
        (name = "Users", description = "User lookups"),
        (name = "Articles", description = "Articles and the popular-articles cache")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token from /auth/sign-in, or the refresh token for /auth/refresh-tokens",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for path in [
            "/auth/sign-up",
            "/auth/sign-in",
            "/auth/refresh-tokens",
            "/users/me",
            "/users/{id}",
            "/articles/create",
            "/articles/popular",
            "/articles/{id}",
            "/articles/update",
            "/articles/delete",
        ] {
            assert!(paths.contains(&path), "missing {path}");
        }
    }
}
