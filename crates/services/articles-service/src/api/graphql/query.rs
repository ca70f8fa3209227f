//! Read-only GraphQL fields.

use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::types::{ArticleType, UserType};
use super::{current_user, FieldResultExt};
use crate::api::AppState;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Read an article. Counts as a view.
    async fn get_article_by_id(&self, ctx: &Context<'_>, article_id: Uuid) -> Result<ArticleType> {
        let state = ctx.data::<AppState>()?;
        let article = state
            .article_service
            .retrieve_article(article_id)
            .await
            .into_field()?;

        Ok(article.into())
    }

    /// Cached popular articles
    async fn get_popular_articles(&self, ctx: &Context<'_>) -> Result<Vec<ArticleType>> {
        let state = ctx.data::<AppState>()?;
        let articles = state
            .article_service
            .retrieve_popular_articles()
            .await
            .into_field()?;

        Ok(articles.into_iter().map(ArticleType::from).collect())
    }

    /// The caller's own profile; needs an access token
    async fn get_my_user_data(&self, ctx: &Context<'_>) -> Result<UserType> {
        let me = current_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let user = state.user_service.get_user(me.id).await.into_field()?;

        Ok(user.into())
    }

    async fn get_user_data(&self, ctx: &Context<'_>, user_id: Uuid) -> Result<UserType> {
        let state = ctx.data::<AppState>()?;
        let user = state.user_service.get_user(user_id).await.into_field()?;

        Ok(user.into())
    }
}
