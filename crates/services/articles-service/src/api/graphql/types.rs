//! GraphQL object and input types.

use async_graphql::{InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::handlers::article_handler::{CreateArticleRequest, UpdateArticleRequest};
use crate::api::handlers::auth_handler::{SignInRequest, SignUpRequest};
use domain::{Article, TokenPair, User};

/// Author as shown on an article
#[derive(SimpleObject)]
pub struct AuthorType {
    pub id: Uuid,
    pub name: String,
}

#[derive(SimpleObject)]
pub struct TopicType {
    pub id: Uuid,
    pub name: String,
}

#[derive(SimpleObject)]
pub struct ArticleType {
    pub id: Uuid,
    pub user: AuthorType,
    pub creation_date: DateTime<Utc>,
    pub topic: TopicType,
    pub text: String,
    pub views: i64,
}

impl From<Article> for ArticleType {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            user: AuthorType {
                id: article.user_id,
                name: article.user_name,
            },
            creation_date: article.creation_date,
            topic: TopicType {
                id: article.topic_id,
                name: article.topic_name,
            },
            text: article.text,
            views: article.views,
        }
    }
}

#[derive(SimpleObject)]
pub struct UserType {
    pub id: Uuid,
    pub name: String,
    pub registration_date: DateTime<Utc>,
}

impl From<User> for UserType {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            registration_date: user.registration_date,
        }
    }
}

#[derive(SimpleObject)]
pub struct TokenPairType {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenPairType {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

/// Name and password for sign-up and sign-in
#[derive(InputObject)]
pub struct AuthInput {
    pub name: String,
    pub password: String,
}

impl From<AuthInput> for SignUpRequest {
    fn from(input: AuthInput) -> Self {
        Self {
            name: input.name,
            password: input.password,
        }
    }
}

impl From<AuthInput> for SignInRequest {
    fn from(input: AuthInput) -> Self {
        Self {
            name: input.name,
            password: input.password,
        }
    }
}

#[derive(InputObject)]
pub struct ArticleCreateInput {
    pub topic_id: Uuid,
    pub text: String,
}

impl From<ArticleCreateInput> for CreateArticleRequest {
    fn from(input: ArticleCreateInput) -> Self {
        Self {
            topic_id: input.topic_id,
            text: input.text,
        }
    }
}

/// Omitted fields keep their value
#[derive(InputObject)]
pub struct ArticleUpdateInput {
    pub id: Uuid,
    pub topic_id: Option<Uuid>,
    pub text: Option<String>,
}

impl From<ArticleUpdateInput> for UpdateArticleRequest {
    fn from(input: ArticleUpdateInput) -> Self {
        Self {
            id: input.id,
            topic_id: input.topic_id,
            text: input.text,
        }
    }
}
