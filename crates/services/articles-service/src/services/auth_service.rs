//! Authentication service - sign-up, sign-in and refresh token rotation.
//!
//! Users live in the relational store; each user's current refresh token
//! lives in the token store. Sign-up and sign-in write both through one
//! composite, relational unit first.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uow::{
    scope, take_reply, Capabilities, Capability, KvSession, Scope, UnitOfWork, UowError,
};
use uuid::Uuid;

use super::workspace::{composite, UnitBuilder, UowName};
use crate::infra::StoreContext;
use crate::repositories::{RepositoryName, TokenRepository, UserRepository};
use common::{AppError, AppResult, JwtConfig};
use domain::{DomainError, Password, TokenPair, TokenType, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Verified against when the name is unknown, so a missing user costs as
/// much as a wrong password.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    Password::new("dummy-password")
        .map(Password::into_string)
        .unwrap_or_default()
});

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
    pub jti: Uuid,
}

/// Authentication service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a user and sign them in
    async fn sign_up(&self, name: String, password: String) -> AppResult<TokenPair>;

    async fn sign_in(&self, name: String, password: String) -> AppResult<TokenPair>;

    /// Exchange a refresh token for a new pair. A refresh token that is not
    /// the user's current one revokes the stored token.
    async fn refresh_tokens(&self, refresh_token: String) -> AppResult<TokenPair>;

    /// Verify an access token and extract its claims
    fn verify_access_token(&self, token: &str) -> AppResult<Claims>;
}

pub struct Authenticator<C: StoreContext> {
    context: Arc<C>,
    jwt: JwtConfig,
}

impl<C: StoreContext> Authenticator<C> {
    pub fn new(context: Arc<C>, jwt: JwtConfig) -> Self {
        Self { context, jwt }
    }

    fn secret(&self) -> &[u8] {
        self.jwt.secret.as_bytes()
    }

    fn refresh_ttl(&self) -> u64 {
        self.jwt.refresh_expiration_sec.max(1) as u64
    }

    fn generate_token(&self, user_id: Uuid, name: &str, token_type: TokenType) -> AppResult<String> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.jwt.access_expiration_sec,
            TokenType::Refresh => self.jwt.refresh_expiration_sec,
        };

        let expires_at = Duration::try_seconds(lifetime)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::internal(format!(
                    "{} token lifetime of {}s is out of range",
                    token_type, lifetime
                ))
            })?;

        let claims = Claims {
            sub: user_id,
            name: name.to_string(),
            token_type,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret()),
        )?)
    }

    fn generate_pair(&self, user_id: Uuid, name: &str) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_token(user_id, name, TokenType::Access)?,
            refresh_token: self.generate_token(user_id, name, TokenType::Refresh)?,
        })
    }

    fn verify_token(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret()),
            &Validation::default(),
        )?
        .claims;

        if claims.token_type != expected {
            return Err(DomainError::invalid_token(format!(
                "expected {} token, got {}",
                expected, claims.token_type
            ))
            .into());
        }
        Ok(claims)
    }

    fn token_unit(
        &self,
        capabilities: Capabilities,
    ) -> AppResult<(Arc<TokenRepository>, Arc<UnitOfWork<KvSession>>)> {
        let session = self.context.token_session();
        let tokens = Arc::new(TokenRepository::new(session.clone(), capabilities));
        let unit = UnitBuilder::new(session)
            .with(RepositoryName::Tokens, &tokens)?
            .build();
        Ok((tokens, unit))
    }
}

/// A concurrent sign-up can take the name between the lookup and the insert.
fn name_taken(err: UowError) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::conflict("User"),
        other => other,
    }
}

#[async_trait]
impl<C: StoreContext> AuthService for Authenticator<C> {
    async fn sign_up(&self, name: String, password: String) -> AppResult<TokenPair> {
        let db = self.context.db_session();
        let users = self.context.users(
            &db,
            Capabilities::of(&[Capability::Create, Capability::Retrieve]),
        );
        let db_unit = UnitBuilder::new(db)
            .with(RepositoryName::Users, &users)?
            .build();
        let (tokens, token_unit) = self.token_unit(Capabilities::of(&[Capability::Create]))?;

        let units = composite(vec![
            (UowName::Database, db_unit as Arc<dyn Scope>),
            (UowName::Tokens, token_unit as Arc<dyn Scope>),
        ])?;

        scope::run(&units, async {
            if users.retrieve_by_name(&name).await?.is_some() {
                return Err(AppError::conflict("User"));
            }

            let password_hash = Password::new(&password)?.into_string();
            let user = User::new(name.clone(), password_hash);
            users.create(&user).await.map_err(name_taken)?;

            let pair = self.generate_pair(user.id, &user.name)?;
            tokens.set(user.id, &pair.refresh_token, self.refresh_ttl())?;
            units.commit_all().await?;

            tracing::info!(user_id = %user.id, "User signed up");
            Ok::<_, AppError>(pair)
        })
        .await
    }

    async fn sign_in(&self, name: String, password: String) -> AppResult<TokenPair> {
        let db = self.context.db_session();
        let users = self.context.users(&db, Capabilities::READ_ONLY);
        let db_unit = UnitBuilder::new(db)
            .with(RepositoryName::Users, &users)?
            .build();
        let (tokens, token_unit) = self.token_unit(Capabilities::of(&[Capability::Create]))?;

        let units = composite(vec![
            (UowName::Database, db_unit as Arc<dyn Scope>),
            (UowName::Tokens, token_unit as Arc<dyn Scope>),
        ])?;

        scope::run(&units, async {
            let user = users.retrieve_by_name(&name).await?;

            let stored_hash = match &user {
                Some(user) => user.password_hash.clone(),
                None => DUMMY_HASH.clone(),
            };
            let password_valid = Password::from_hash(stored_hash).verify(&password);

            let user = match user {
                Some(user) if password_valid => user,
                _ => return Err(AppError::InvalidCredentials),
            };

            let pair = self.generate_pair(user.id, &user.name)?;
            tokens.set(user.id, &pair.refresh_token, self.refresh_ttl())?;
            units.commit_all().await?;

            tracing::info!(user_id = %user.id, "User signed in");
            Ok::<_, AppError>(pair)
        })
        .await
    }

    async fn refresh_tokens(&self, refresh_token: String) -> AppResult<TokenPair> {
        let claims = self.verify_token(&refresh_token, TokenType::Refresh)?;
        let (tokens, unit) = self.token_unit(Capabilities::CRUD)?;

        scope::run(unit.as_ref(), async {
            let index = tokens.get(claims.sub)?;
            let mut replies = unit.commit().await?;
            let stored = take_reply(&mut replies, index)?.into_optional_text()?;

            if stored.as_deref() != Some(refresh_token.as_str()) {
                tokens.delete(claims.sub)?;
                unit.commit().await?;
                tracing::warn!(user_id = %claims.sub, "Stale refresh token presented, session revoked");
                return Err(AppError::Unauthorized);
            }

            let pair = self.generate_pair(claims.sub, &claims.name)?;
            tokens.set(claims.sub, &pair.refresh_token, self.refresh_ttl())?;
            unit.commit().await?;

            tracing::debug!(user_id = %claims.sub, "Refresh token rotated");
            Ok::<_, AppError>(pair)
        })
        .await
    }

    fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        self.verify_token(token, TokenType::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryContext;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-hs256";

    fn authenticator() -> (Arc<MemoryContext>, Authenticator<MemoryContext>) {
        let context = Arc::new(MemoryContext::new());
        let jwt = JwtConfig {
            secret: SECRET.to_string(),
            ..JwtConfig::default()
        };
        (context.clone(), Authenticator::new(context, jwt))
    }

    #[tokio::test]
    async fn test_sign_up_stores_user_and_refresh_token() {
        let (context, auth) = authenticator();

        let pair = auth.sign_up("alice".into(), "secret1".into()).await.unwrap();

        let claims = auth.verify_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.name, "alice");
        assert!(context.committed().users.contains_key(&claims.sub));

        let key = TokenRepository::key(claims.sub);
        assert_eq!(context.tokens.value(&key), Some(pair.refresh_token));
        assert_eq!(
            context.tokens.expiration(&key),
            Some(domain::DEFAULT_REFRESH_TOKEN_EXPIRATION_SEC as u64)
        );
    }

    #[tokio::test]
    async fn test_sign_up_with_taken_name_writes_nothing() {
        let (context, auth) = authenticator();
        context.seed_user("alice", "secret1");

        let err = auth
            .sign_up("alice".into(), "other12".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(context.committed().users.len(), 1);
        assert!(context.tokens.keys().is_empty());
        assert_eq!(context.tokens.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_token_lifetime_fails_sign_up_cleanly() {
        let context = Arc::new(MemoryContext::new());
        let auth = Authenticator::new(
            context.clone(),
            JwtConfig {
                secret: SECRET.to_string(),
                access_expiration_sec: i64::MAX,
                ..JwtConfig::default()
            },
        );

        let err = auth
            .sign_up("alice".into(), "secret1".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(msg) if msg.contains("out of range")));
        assert!(context.committed().users.is_empty());
        assert_eq!(context.tokens.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_name_taken_at_insert_is_a_user_conflict() {
        let (context, _) = authenticator();
        context.seed_user("alice", "secret1");

        let db = context.db_session();
        let users = context.users(&db, Capabilities::of(&[Capability::Create]));
        let unit = UnitBuilder::new(db)
            .with(RepositoryName::Users, &users)
            .unwrap()
            .build();

        let err = scope::run(unit.as_ref(), async {
            let late = User::new("alice".into(), "hash".into());
            users.create(&late).await.map_err(name_taken)?;
            unit.commit().await?;
            Ok::<_, AppError>(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref entity) if entity == "User"));
        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
        assert_eq!(context.committed().users.len(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_credentials() {
        let (context, auth) = authenticator();
        context.seed_user("alice", "secret1");

        let wrong_password = auth.sign_in("alice".into(), "nope123".into()).await;
        let unknown_user = auth.sign_in("bob".into(), "secret1".into()).await;

        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AppError::InvalidCredentials)));
        assert!(context.tokens.keys().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_replaces_stored_refresh_token() {
        let (context, auth) = authenticator();
        let user = context.seed_user("alice", "secret1");

        let pair = auth.sign_in("alice".into(), "secret1".into()).await.unwrap();

        assert_eq!(
            context.tokens.value(&TokenRepository::key(user.id)),
            Some(pair.refresh_token)
        );
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_rejects_reuse() {
        let (context, auth) = authenticator();
        let first = auth.sign_up("alice".into(), "secret1".into()).await.unwrap();
        let user_id = auth.verify_access_token(&first.access_token).unwrap().sub;
        let key = TokenRepository::key(user_id);

        let second = auth.refresh_tokens(first.refresh_token.clone()).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(context.tokens.value(&key), Some(second.refresh_token.clone()));

        let reused = auth.refresh_tokens(first.refresh_token).await;
        assert!(matches!(reused, Err(AppError::Unauthorized)));
        assert_eq!(context.tokens.value(&key), None);

        let revoked = auth.refresh_tokens(second.refresh_token).await;
        assert!(matches!(revoked, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let (_context, auth) = authenticator();
        let pair = auth.sign_up("alice".into(), "secret1".into()).await.unwrap();

        let err = auth.refresh_tokens(pair.access_token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));

        let err = auth.verify_access_token(&pair.refresh_token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let (context, auth) = authenticator();
        let other = Authenticator::new(
            context,
            JwtConfig {
                secret: "another-secret-key-that-is-long-enough-too".to_string(),
                ..JwtConfig::default()
            },
        );

        let token = other
            .generate_token(Uuid::new_v4(), "mallory", TokenType::Access)
            .unwrap();

        assert!(auth.verify_access_token(&token).is_err());
    }
}
