//! User service
//!
//! Registration, sign-in, sign-out and session validation. This is the
//! identity capability the login form and the header read from.

use crate::config::AuthConfig;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, User};
use crate::services::login::{validate_credentials, Authenticator, FieldErrors};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Input failed the credential schema
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// Email already registered
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Canonical form of an email used for storage and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    auth: AuthConfig,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            auth,
        }
    }

    /// Register a new user.
    ///
    /// The email is trimmed and lowercased before it goes through the same
    /// schema as the login form.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let email = normalize_email(&input.email);
        validate_credentials(&email, &input.password)
            .map_err(UserServiceError::ValidationError)?;

        if self
            .user_repo
            .exists_by_email(&email)
            .await
            .context("Failed to check email")?
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = self
            .user_repo
            .create(&CreateUserInput {
                email,
                password_hash,
            })
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = user.id, "Registered new user");
        Ok(user)
    }

    /// Verify credentials and open a session.
    ///
    /// `remember_me` selects the long session lifetime.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<Session, UserServiceError> {
        let email = normalize_email(email);
        let invalid = || UserServiceError::AuthenticationError("Invalid email or password".to_string());

        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to get user by email")?
            .ok_or_else(invalid)?;

        let valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(invalid());
        }

        let session = Session::new(user.id, self.session_lifetime(remember_me));
        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::debug!(user_id = user.id, remember_me, "Opened session");
        Ok(created)
    }

    /// Invalidate a session. Unknown tokens are ignored.
    pub async fn sign_out(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted and treated as absent.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {:#}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    /// Session lifetime for a sign-in
    pub fn session_lifetime(&self, remember_me: bool) -> Duration {
        if remember_me {
            Duration::days(self.auth.remember_me_days)
        } else {
            Duration::hours(self.auth.session_hours)
        }
    }
}

#[async_trait]
impl Authenticator for UserService {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<Session, UserServiceError> {
        UserService::sign_in(self, email, password, remember_me).await
    }
}
