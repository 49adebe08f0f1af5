//! Rate limiter for login attempts
//!
//! Protects sign-in against brute force:
//! - failed attempts per email (5 per 15 minutes)
//! - requests per client IP (10 per minute)

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;

const EMAIL_MAX_FAILURES: usize = 5;
const IP_MAX_REQUESTS: usize = 10;

fn email_window() -> Duration {
    Duration::minutes(15)
}

fn ip_window() -> Duration {
    Duration::minutes(1)
}

/// Why a sign-in attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitReason {
    TooManyFailures,
    TooManyRequests,
}

impl RateLimitReason {
    pub fn message(&self) -> &'static str {
        match self {
            RateLimitReason::TooManyFailures => {
                "Too many failed login attempts. Please try again in 15 minutes."
            }
            RateLimitReason::TooManyRequests => {
                "Too many requests. Please slow down and try again shortly."
            }
        }
    }
}

/// Login rate limiter
#[derive(Default)]
pub struct LoginRateLimiter {
    failures: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    requests: RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request from `ip` (when known) and check both limits.
    ///
    /// The request is counted even when it ends up refused.
    pub async fn check(&self, email: &str, ip: Option<IpAddr>) -> Result<(), RateLimitReason> {
        if let Some(ip) = ip {
            if self.is_ip_limited(ip).await {
                return Err(RateLimitReason::TooManyRequests);
            }
            self.record_ip_request(ip).await;
        }
        if self.is_email_limited(email).await {
            return Err(RateLimitReason::TooManyFailures);
        }
        Ok(())
    }

    /// Check if an email has too many recent failures
    pub async fn is_email_limited(&self, email: &str) -> bool {
        let mut failures = self.failures.write().await;
        let cutoff = Utc::now() - email_window();

        let attempts = failures.entry(email.to_lowercase()).or_default();
        attempts.retain(|time| *time > cutoff);

        attempts.len() >= EMAIL_MAX_FAILURES
    }

    /// Record a failed sign-in for an email
    pub async fn record_failed_attempt(&self, email: &str) {
        let mut failures = self.failures.write().await;
        failures
            .entry(email.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget failures for an email after a successful sign-in
    pub async fn clear_failures(&self, email: &str) {
        self.failures.write().await.remove(&email.to_lowercase());
    }

    /// Check if an IP has made too many recent requests
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let mut requests = self.requests.write().await;
        let cutoff = Utc::now() - ip_window();

        let attempts = requests.entry(ip).or_default();
        attempts.retain(|time| *time > cutoff);

        attempts.len() >= IP_MAX_REQUESTS
    }

    /// Record a request from an IP
    pub async fn record_ip_request(&self, ip: IpAddr) {
        self.requests.write().await.entry(ip).or_default().push(Utc::now());
    }

    /// Drop stale entries. Called periodically from a background task.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let email_cutoff = now - email_window();
        let ip_cutoff = now - ip_window();

        self.failures.write().await.retain(|_, times| {
            times.retain(|time| *time > email_cutoff);
            !times.is_empty()
        });

        self.requests.write().await.retain(|_, times| {
            times.retain(|time| *time > ip_cutoff);
            !times.is_empty()
        });
    }

    /// Number of emails and IPs currently tracked
    pub async fn tracked(&self) -> (usize, usize) {
        (self.failures.read().await.len(), self.requests.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_email_limit_after_five_failures() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            limiter.record_failed_attempt("kid@example.com").await;
        }
        assert!(!limiter.is_email_limited("kid@example.com").await);

        limiter.record_failed_attempt("kid@example.com").await;
        assert!(limiter.is_email_limited("kid@example.com").await);
        assert_eq!(
            limiter.check("kid@example.com", None).await,
            Err(RateLimitReason::TooManyFailures)
        );

        limiter.clear_failures("kid@example.com").await;
        assert!(limiter.check("kid@example.com", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_email_keys_are_case_insensitive() {
        let limiter = LoginRateLimiter::new();

        for email in ["Kid@Example.com", "kid@example.com", "KID@EXAMPLE.COM", "kid@example.COM", "kId@example.com"] {
            limiter.record_failed_attempt(email).await;
        }

        assert!(limiter.is_email_limited("kid@example.com").await);
    }

    #[tokio::test]
    async fn test_ip_limit_counts_checks() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("10.0.0.7").unwrap();

        for i in 0..10 {
            let email = format!("user{}@example.com", i);
            assert!(limiter.check(&email, Some(ip)).await.is_ok());
        }

        assert_eq!(
            limiter.check("other@example.com", Some(ip)).await,
            Err(RateLimitReason::TooManyRequests)
        );
    }

    #[tokio::test]
    async fn test_cleanup_drops_empty_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failed_attempt("kid@example.com").await;
        limiter.failures.write().await.insert(
            "old@example.com".to_string(),
            vec![Utc::now() - Duration::hours(1)],
        );

        limiter.cleanup().await;

        assert_eq!(limiter.tracked().await, (1, 0));
    }
}
