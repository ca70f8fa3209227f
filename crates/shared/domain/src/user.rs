//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub registration_date: DateTime<Utc>,
}

impl User {
    /// Create a user registered now
    pub fn new(name: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            password_hash,
            registration_date: Utc::now(),
        }
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    /// Unique user identifier
    pub id: Uuid,
    /// User name
    pub name: String,
    /// Registration timestamp
    pub registration_date: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            registration_date: user.registration_date,
        }
    }
}
