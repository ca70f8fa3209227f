//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;

use common::{CacheConfig, DatabaseConfig, JwtConfig, PopularArticlesConfig, ServerConfig};
use domain::MIN_JWT_SECRET_LENGTH;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub jwt: JwtConfig,
    pub popular_articles: PopularArticlesConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("database_url", &"[REDACTED]")
            .field("redis_article_url", &"[REDACTED]")
            .field("redis_token_url", &"[REDACTED]")
            .field("jwt", &self.jwt)
            .field("popular_articles", &self.popular_articles)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set in a release build or is too short.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let server_defaults = ServerConfig::default();
        let database_defaults = DatabaseConfig::default();
        let cache_defaults = CacheConfig::default();
        let jwt_defaults = JwtConfig::default();
        let popular_defaults = PopularArticlesConfig::default();

        let shared_redis = env::var("REDIS_URL").ok();

        Self {
            server: ServerConfig {
                app_name: env::var("APP_NAME").unwrap_or(server_defaults.app_name),
                host: env::var("SERVER_HOST").unwrap_or(server_defaults.host),
                port: parse_var("SERVER_PORT", server_defaults.port),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(database_defaults.url),
                max_connections: parse_var(
                    "DATABASE_MAX_CONNECTIONS",
                    database_defaults.max_connections,
                ),
                min_connections: parse_var(
                    "DATABASE_MIN_CONNECTIONS",
                    database_defaults.min_connections,
                ),
            },
            cache: CacheConfig {
                article_url: env::var("REDIS_ARTICLE_URL")
                    .ok()
                    .or_else(|| shared_redis.clone())
                    .unwrap_or(cache_defaults.article_url),
                token_url: env::var("REDIS_TOKEN_URL")
                    .ok()
                    .or(shared_redis)
                    .unwrap_or(cache_defaults.token_url),
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_expiration_sec: parse_var(
                    "ACCESS_TOKEN_EXPIRATION_IN_SEC",
                    jwt_defaults.access_expiration_sec,
                ),
                refresh_expiration_sec: parse_var(
                    "REFRESH_TOKEN_EXPIRATION_IN_SEC",
                    jwt_defaults.refresh_expiration_sec,
                ),
            },
            popular_articles: PopularArticlesConfig {
                refresh_interval_sec: parse_var(
                    "POPULAR_ARTICLES_REFRESH_SEC",
                    popular_defaults.refresh_interval_sec,
                ),
                window_sec: parse_var(
                    "POPULAR_ARTICLES_WINDOW_SEC",
                    popular_defaults.window_sec,
                ),
                count: parse_var("POPULAR_ARTICLES_COUNT", popular_defaults.count),
            },
        }
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
