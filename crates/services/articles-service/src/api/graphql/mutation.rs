//! GraphQL fields that change state.

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::types::{
    ArticleCreateInput, ArticleType, ArticleUpdateInput, AuthInput, TokenPairType,
};
use super::{current_user, BearerToken, FieldResultExt};
use crate::api::extractors::validate;
use crate::api::handlers::article_handler::{CreateArticleRequest, UpdateArticleRequest};
use crate::api::handlers::auth_handler::{SignInRequest, SignUpRequest};
use crate::api::AppState;
use common::AppError;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn sign_up(&self, ctx: &Context<'_>, user_init_data: AuthInput) -> Result<TokenPairType> {
        let request = SignUpRequest::from(user_init_data);
        validate(&request).into_field()?;

        let state = ctx.data::<AppState>()?;
        let tokens = state
            .auth_service
            .sign_up(request.name, request.password)
            .await
            .into_field()?;

        Ok(tokens.into())
    }

    async fn sign_in(&self, ctx: &Context<'_>, user_init_data: AuthInput) -> Result<TokenPairType> {
        let request = SignInRequest::from(user_init_data);
        validate(&request).into_field()?;

        let state = ctx.data::<AppState>()?;
        let tokens = state
            .auth_service
            .sign_in(request.name, request.password)
            .await
            .into_field()?;

        Ok(tokens.into())
    }

    /// Rotate the pair; the refresh token travels as the bearer token
    async fn refresh_tokens(&self, ctx: &Context<'_>) -> Result<TokenPairType> {
        let BearerToken(token) = ctx
            .data_opt::<BearerToken>()
            .cloned()
            .ok_or(AppError::Unauthorized)
            .into_field()?;

        let state = ctx.data::<AppState>()?;
        let tokens = state.auth_service.refresh_tokens(token).await.into_field()?;

        Ok(tokens.into())
    }

    async fn create_article(
        &self,
        ctx: &Context<'_>,
        article_info: ArticleCreateInput,
    ) -> Result<ArticleType> {
        let me = current_user(ctx)?;
        let request = CreateArticleRequest::from(article_info);
        validate(&request).into_field()?;

        let state = ctx.data::<AppState>()?;
        let article = state
            .article_service
            .create_article(me.id, request.topic_id, request.text)
            .await
            .into_field()?;

        Ok(article.into())
    }

    async fn update_article(
        &self,
        ctx: &Context<'_>,
        article_info: ArticleUpdateInput,
    ) -> Result<ArticleType> {
        let me = current_user(ctx)?;
        let request = UpdateArticleRequest::from(article_info);
        validate(&request).into_field()?;

        let state = ctx.data::<AppState>()?;
        let id = request.id;
        let article = state
            .article_service
            .update_article(me.id, id, request.into())
            .await
            .into_field()?;

        Ok(article.into())
    }

    /// Returns the deleted article's ID
    async fn delete_article(&self, ctx: &Context<'_>, article_id: Uuid) -> Result<Uuid> {
        let me = current_user(ctx)?;

        let state = ctx.data::<AppState>()?;
        state
            .article_service
            .delete_article(me.id, article_id)
            .await
            .into_field()?;

        Ok(article_id)
    }
}
