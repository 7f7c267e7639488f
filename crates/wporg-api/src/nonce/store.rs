use std::fmt;
use std::sync::{PoisonError, RwLock};

use tracing::trace;

/// An opaque REST API nonce.
///
/// WordPress does not declare an expiry, so a nonce is treated as valid
/// until a request carrying it is rejected.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    /// Build a nonce from raw text, trimming surrounding whitespace.
    ///
    /// Returns `None` for empty input: an empty header value would be
    /// indistinguishable from no nonce at all.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Nonces authorize requests; keep them out of logs.
impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nonce(****)")
    }
}

impl AsRef<str> for Nonce {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Holds zero or one nonce for a single API client.
///
/// Written only by the executor after a complete retrieval, read by every
/// outgoing request. The lock keeps concurrent logical calls on one client
/// from observing a torn value; it does not de-duplicate refreshes.
#[derive(Debug, Default)]
pub struct NonceStore {
    value: RwLock<Option<Nonce>>,
}

impl NonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached nonce, if any.
    pub fn get(&self) -> Option<Nonce> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the cached nonce.
    pub fn set(&self, nonce: Nonce) {
        trace!("storing nonce");
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(nonce);
    }

    /// Forget the cached nonce.
    pub fn clear(&self) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
