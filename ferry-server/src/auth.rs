//! Shared-secret authorization gate
//!
//! One secret guards every operation. The caller sends it in the
//! `x-secret-key` header and it must equal the configured value exactly.
//! There are no roles or per-user credentials. By default the comparison
//! is plain string equality; [`SecretComparison::ConstantTime`] is
//! available for hosts that want timing-independent checks.

use axum::http::HeaderMap;
use std::fmt;
use subtle::ConstantTimeEq;

/// Header carrying the caller's credential
pub const SECRET_HEADER: &str = "x-secret-key";

/// How the presented secret is compared with the configured one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretComparison {
    /// Ordinary string equality
    #[default]
    Plain,
    /// Constant-time byte comparison
    ConstantTime,
}

/// The configured secret. `Debug` never prints the value.
#[derive(Clone)]
pub struct SecretKey {
    value: String,
    comparison: SecretComparison,
}

impl SecretKey {
    /// Secret compared with plain equality
    pub fn new(value: impl Into<String>) -> Self {
        Self::with_comparison(value, SecretComparison::Plain)
    }

    /// Secret with an explicit comparison mode
    pub fn with_comparison(value: impl Into<String>, comparison: SecretComparison) -> Self {
        Self {
            value: value.into(),
            comparison,
        }
    }

    /// Comparison mode in use
    pub fn comparison(&self) -> SecretComparison {
        self.comparison
    }

    /// Whether `presented` equals the configured secret (case-sensitive)
    pub fn matches(&self, presented: &str) -> bool {
        match self.comparison {
            SecretComparison::Plain => presented == self.value,
            SecretComparison::ConstantTime => {
                bool::from(presented.as_bytes().ct_eq(self.value.as_bytes()))
            }
        }
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("value", &"<redacted>")
            .field("comparison", &self.comparison)
            .finish()
    }
}

/// True iff the request carries the configured secret
pub fn authorize(headers: &HeaderMap, secret: &SecretKey) -> bool {
    headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|presented| secret.matches(presented))
        .unwrap_or(false)
}
