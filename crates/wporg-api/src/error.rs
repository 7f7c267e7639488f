use thiserror::Error;

/// Top-level error type for the `wporg-api` crate.
///
/// Retrying is confined to the executor, so callers only ever see the
/// final outcome of a logical call: a recovered 401 never surfaces here.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The site rejected the request (401/403) and no fresh nonce could
    /// be obtained with the configured credentials.
    #[error("Could not authenticate with the site: {message}")]
    AuthenticationRequired { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A header value could not be encoded (e.g. a token with control characters).
    #[error("Invalid value for header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    /// The caller cancelled the logical call before it finished.
    #[error("Request cancelled")]
    Cancelled,

    // ── Endpoint ────────────────────────────────────────────────────
    /// Non-success response from the REST endpoint, after any
    /// authentication handling. `code` is WordPress's error slug
    /// (e.g. `rest_post_invalid_id`) when the body carried one.
    #[error("Endpoint error (HTTP {status}): {message}")]
    Endpoint {
        status: u16,
        code: Option<String>,
        message: String,
        body: String,
    },

    /// No REST API root could be found for a site URL.
    #[error("No WordPress REST API found at {url}")]
    ApiRootNotFound { url: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request body could not be encoded as JSON.
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    // ── Auth mode ───────────────────────────────────────────────────
    /// Operation not available for the client's authentication mode.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl Error {
    /// Returns `true` if the site refused our credentials, either directly
    /// (a terminal 401/403) or after a failed nonce refresh.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::AuthenticationRequired { .. } => true,
            Self::Endpoint { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying later.
    ///
    /// The executor itself never retries these.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Endpoint { status, .. } => matches!(status, 429 | 502..=504),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Endpoint { status: 404, .. } | Self::ApiRootNotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// HTTP status of the failing response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Endpoint { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// WordPress error slug, if the endpoint returned one.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Endpoint { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
