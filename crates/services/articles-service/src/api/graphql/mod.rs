//! GraphQL endpoint mirroring the REST surface.
//!
//! Served at `/graphql` (POST for operations, GET for GraphiQL). The same
//! services back both surfaces; a valid access token in the Authorization
//! header becomes the [`CurrentUser`] for protected fields.

mod mutation;
mod query;
mod types;

use async_graphql::{
    http::GraphiQLSource, Context, EmptySubscription, ErrorExtensions, Schema,
};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{response::Html, routing::get, Extension, Router};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use common::{AppError, AppResult};

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type ArticlesSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub const GRAPHQL_PATH: &str = "/graphql";

const MAX_QUERY_DEPTH: usize = 8;

/// Raw bearer token of the request, whatever its type
#[derive(Clone)]
pub(crate) struct BearerToken(pub String);

pub fn build_schema(state: AppState) -> ArticlesSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .limit_depth(MAX_QUERY_DEPTH)
        .data(state)
        .finish()
}

/// Routes for the GraphQL endpoint
pub fn graphql_routes(schema: ArticlesSchema) -> Router<AppState> {
    Router::new()
        .route(GRAPHQL_PATH, get(graphiql).post(graphql_handler))
        .layer(Extension(schema))
}

async fn graphql_handler(
    Extension(schema): Extension<ArticlesSchema>,
    current_user: Option<Extension<CurrentUser>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = request.into_inner();

    if let Some(Extension(user)) = current_user {
        request = request.data(user);
    }
    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        request = request.data(BearerToken(bearer.token().to_string()));
    }

    schema.execute(request).await.into()
}

async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

/// Render an [`AppError`] as a field error carrying the same code as REST.
pub(crate) trait FieldResultExt<T> {
    fn into_field(self) -> async_graphql::Result<T>;
}

impl<T> FieldResultExt<T> for AppResult<T> {
    fn into_field(self) -> async_graphql::Result<T> {
        self.map_err(|err| {
            let code = err.code();
            async_graphql::Error::new(err.user_message())
                .extend_with(|_, extensions| extensions.set("code", code.to_string()))
        })
    }
}

/// Fail with UNAUTHORIZED unless the request carried a valid access token.
pub(crate) fn current_user(ctx: &Context<'_>) -> async_graphql::Result<CurrentUser> {
    ctx.data_opt::<CurrentUser>()
        .cloned()
        .ok_or(AppError::Unauthorized)
        .into_field()
}
