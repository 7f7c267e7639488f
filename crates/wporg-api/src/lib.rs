// wporg-api: async client for the WordPress REST API
//
// Self-hosted sites authenticate with a cookie session + `X-WP-Nonce`,
// refreshed transparently once per call on 401/403. wordpress.com-hosted
// sites use a bearer token and are never retried.

pub mod auth;
pub mod client;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod nonce;
pub mod request;
pub mod transport;

pub use auth::{AuthStrategy, Authenticator, SiteCredential};
pub use client::{ApiBase, DOTCOM_API_ROOT, WordPressOrgRestApi};
pub use discovery::discover_api_root;
pub use error::Error;
pub use executor::{Executor, NONCE_HEADER};
pub use nonce::{Nonce, NonceRetrieval, NonceStore, RetrievalMethod};
pub use request::{ApiRequest, ApiResponse, RequestBody};
pub use transport::{TlsMode, TransportConfig};

// Re-exported so callers can cancel calls without depending on tokio-util.
pub use tokio_util::sync::CancellationToken;
