//! Login form
//!
//! Validates the credential schema, guards against duplicate in-flight
//! submissions, applies the brute-force limits and maps the identity
//! capability's answer to a navigation target and toast.

use crate::models::Session;
use crate::services::rate_limiter::{LoginRateLimiter, RateLimitReason};
use crate::services::toast::Toast;
use crate::services::user::{normalize_email, UserServiceError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Where a successful sign-in navigates to
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Minimum password length
pub const MIN_PASSWORD_CHARS: usize = 8;

const INVALID_EMAIL: &str = "Invalid email";
const PASSWORD_TOO_SHORT: &str = "String must contain at least 8 character(s)";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+\-]@([A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// Whether `email` is a syntactically valid address
pub fn is_valid_email(email: &str) -> bool {
    if email.starts_with('.') || email.contains("..") {
        return false;
    }
    EMAIL_RE.is_match(email)
}

/// Field name to message, one message per field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", joined.join("; "))
    }
}

/// Check an email/password pair against the credential schema
pub fn validate_credentials(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if !is_valid_email(email) {
        errors.insert("email_address", INVALID_EMAIL);
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        errors.insert("password", PASSWORD_TOO_SHORT);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Login form payload, accepted both as JSON and as an HTML form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub remember_me: bool,
}

impl LoginInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>, remember_me: bool) -> Self {
        Self {
            email_address: email.into(),
            password: password.into(),
            remember_me,
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        validate_credentials(&self.email_address, &self.password)
    }
}

/// Accepts JSON booleans and HTML checkbox values (`on`, `true`, `1`)
fn checkbox<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Text(s) => matches!(s.as_str(), "on" | "true" | "1"),
    })
}

/// The sign-in capability
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<Session, UserServiceError>;
}

/// Result of one login submission
#[derive(Debug)]
pub enum LoginOutcome {
    /// Signed in; navigate to [`DASHBOARD_PATH`]
    SignedIn { session: Session, remember_me: bool },
    /// Schema failed; nothing was dispatched
    Invalid(FieldErrors),
    /// A submission for the same form or account is still outstanding
    InFlight,
    /// Refused by the brute-force limits
    RateLimited(RateLimitReason),
    /// The identity capability rejected the credentials
    Failed,
    /// The identity capability failed unexpectedly
    Errored,
}

impl LoginOutcome {
    pub fn redirect_to(&self) -> Option<&'static str> {
        match self {
            LoginOutcome::SignedIn { .. } => Some(DASHBOARD_PATH),
            _ => None,
        }
    }

    pub fn toast(&self) -> Option<Toast> {
        match self {
            LoginOutcome::SignedIn { .. } => Some(welcome_toast()),
            LoginOutcome::Failed => Some(Toast::error(
                "Login failed",
                "There was an error logging in. Please try again.",
            )),
            LoginOutcome::Errored => {
                Some(Toast::error("Something went wrong", "Please try again later"))
            }
            LoginOutcome::RateLimited(reason) => Some(Toast::error("Login failed", reason.message())),
            LoginOutcome::Invalid(_) | LoginOutcome::InFlight => None,
        }
    }
}

/// Shown on the page a successful sign-in lands on
pub fn welcome_toast() -> Toast {
    Toast::info("Login Successful", "Welcome back to ColorMyPage!")
}

/// Keys with a submission currently outstanding
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    keys: Mutex<HashSet<String>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` if it is already claimed.
    /// The claim is released when the ticket is dropped.
    pub fn try_acquire(self: &Arc<Self>, key: &str) -> Option<InFlightTicket> {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.to_string()) {
            return None;
        }
        Some(InFlightTicket {
            registry: Arc::clone(self),
            key: key.to_string(),
        })
    }

    pub fn is_claimed(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}

/// Claim on an [`InFlightRegistry`] key
#[derive(Debug)]
pub struct InFlightTicket {
    registry: Arc<InFlightRegistry>,
    key: String,
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.registry
            .keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

/// Server-side login flow
pub struct LoginService {
    authenticator: Arc<dyn Authenticator>,
    rate_limiter: Arc<LoginRateLimiter>,
    in_flight: Arc<InFlightRegistry>,
}

impl LoginService {
    pub fn new(authenticator: Arc<dyn Authenticator>, rate_limiter: Arc<LoginRateLimiter>) -> Self {
        Self {
            authenticator,
            rate_limiter,
            in_flight: Arc::new(InFlightRegistry::new()),
        }
    }

    pub async fn submit(&self, input: &LoginInput, client_ip: Option<IpAddr>) -> LoginOutcome {
        if let Err(errors) = input.validate() {
            return LoginOutcome::Invalid(errors);
        }

        let email = normalize_email(&input.email_address);
        let Some(_ticket) = self.in_flight.try_acquire(&email) else {
            tracing::debug!("Rejected duplicate login submission");
            return LoginOutcome::InFlight;
        };

        if let Err(reason) = self.rate_limiter.check(&email, client_ip).await {
            tracing::warn!(?client_ip, "Login rate limited: {:?}", reason);
            return LoginOutcome::RateLimited(reason);
        }

        match self
            .authenticator
            .sign_in(&email, &input.password, input.remember_me)
            .await
        {
            Ok(session) => {
                self.rate_limiter.clear_failures(&email).await;
                LoginOutcome::SignedIn {
                    session,
                    remember_me: input.remember_me,
                }
            }
            Err(UserServiceError::AuthenticationError(_)) => {
                self.rate_limiter.record_failed_attempt(&email).await;
                LoginOutcome::Failed
            }
            Err(e) => {
                tracing::error!("Login error: {}", e);
                LoginOutcome::Errored
            }
        }
    }
}

/// Enabled state of the form controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormControls {
    pub inputs_disabled: bool,
    pub submit_disabled: bool,
    pub visibility_toggle_disabled: bool,
}

impl FormControls {
    pub fn idle() -> Self {
        Self::with_busy(false)
    }

    fn with_busy(busy: bool) -> Self {
        Self {
            inputs_disabled: busy,
            submit_disabled: busy,
            visibility_toggle_disabled: busy,
        }
    }
}

/// State of one login form: at most one submission in flight
pub struct LoginForm {
    service: Arc<LoginService>,
    submitting: AtomicBool,
    password_visible: AtomicBool,
}

struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LoginForm {
    pub fn new(service: Arc<LoginService>) -> Self {
        Self {
            service,
            submitting: AtomicBool::new(false),
            password_visible: AtomicBool::new(false),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn controls(&self) -> FormControls {
        FormControls::with_busy(self.is_submitting())
    }

    pub fn is_password_visible(&self) -> bool {
        self.password_visible.load(Ordering::Acquire)
    }

    /// Flip password visibility. Ignored while a submission is outstanding.
    pub fn toggle_password_visibility(&self) -> bool {
        if !self.is_submitting() {
            self.password_visible.fetch_xor(true, Ordering::AcqRel);
        }
        self.is_password_visible()
    }

    /// Submit the form. A second submit while one is outstanding is not
    /// dispatched and yields [`LoginOutcome::InFlight`].
    pub async fn submit(&self, input: &LoginInput, client_ip: Option<IpAddr>) -> LoginOutcome {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return LoginOutcome::InFlight;
        }
        let _guard = SubmittingGuard(&self.submitting);

        self.service.submit(input, client_ip).await
    }
}
