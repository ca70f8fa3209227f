//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

use uuid::{uuid, Uuid};

// =============================================================================
// Users
// =============================================================================

/// Minimum user name length
pub const MIN_USERNAME_LENGTH: u64 = 3;

/// Maximum user name length
pub const MAX_USERNAME_LENGTH: u64 = 20;

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: u64 = 5;

/// Maximum password length requirement
pub const MAX_PASSWORD_LENGTH: u64 = 20;

// =============================================================================
// Articles
// =============================================================================

/// Maximum article text length in characters
pub const MAX_ARTICLE_LENGTH: u64 = 10_000;

/// How far back the popularity refresh looks (one day)
pub const MOST_VIEWED_ARTICLE_LIFETIME_IN_SEC: u64 = 86_400;

/// Number of articles kept in the popular cache
pub const POPULAR_ARTICLES_COUNT: u64 = 10;

/// Date format used when articles are written to the cache
pub const DATETIME_STRING_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

// =============================================================================
// Topics (seeded by migration)
// =============================================================================

pub const TOPIC_TECH_ID: Uuid = uuid!("b1935073-7f62-4c49-8dd6-443fcc2451ab");
pub const TOPIC_SCIENCE_ID: Uuid = uuid!("81dec9ae-f59f-4ee4-b817-ffa3bf9d6f92");
pub const TOPIC_NEWS_ID: Uuid = uuid!("2a20d146-76ed-463c-a7aa-d344710077e3");

// =============================================================================
// Authentication
// =============================================================================

/// Default access token lifetime (30 minutes)
pub const DEFAULT_ACCESS_TOKEN_EXPIRATION_SEC: i64 = 1_800;

/// Default refresh token lifetime (30 days)
pub const DEFAULT_REFRESH_TOKEN_EXPIRATION_SEC: i64 = 2_592_000;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// JWT token type identifier
pub const TOKEN_TYPE_BEARER: &str = "Bearer";
