/// User account model
///
/// Users own boards and appear on other users' boards via membership rows.
/// Passwords are stored as Argon2id hashes, never in plaintext.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User model representing a user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (case-insensitive via CITEXT)
    ///
    /// Must be unique across all users
    pub email: String,

    /// Argon2id password hash
    ///
    /// Never serialized into responses; see [`UserSummary`]
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address (stored lowercase)
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Safe projection of a user for response bodies
///
/// This is the only user shape that crosses the API boundary when a user
/// appears inside someone else's data (board owners, member lists, assignees).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

impl User {
    /// Returns the safe projection of this user
    pub fn summary(&self) -> UserSummary {
        UserSummary::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=65536,t=3,p=4$abc$def".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_drops_password_hash() {
        let user = sample_user();
        let summary = user.summary();

        assert_eq!(summary.id, user.id);
        assert_eq!(summary.email, user.email);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_user_serialization_skips_password_hash() {
        let user = sample_user();
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "test@example.com");
    }
}
