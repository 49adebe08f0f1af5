//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// The listing and header flows only read the identifier and whether a user
/// is present at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, stored lowercase)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user value that has not been stored yet.
    ///
    /// The password must already be hashed with
    /// `services::password::hash_password()`.
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: 0,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("kid@example.com".to_string(), "secret-hash".to_string());
        let json = serde_json::to_string(&user).unwrap();

        assert!(json.contains("kid@example.com"));
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
