// Authenticated request executor
//
// Runs one logical API call as an explicit state machine:
//
//   Send { retried: false } ─ 2xx ──────────────────────────────▶ Success
//        │                   ─ 401/403 (self-hosted) ──▶ Refreshing
//        │                   ─ other status / transport ─▶ Failed
//   Refreshing ─ nonce ─▶ Send { retried: true } ─ 2xx ──────────▶ Success
//              ─ none ──▶ Failed (AuthenticationRequired)      ─ else ─▶ Failed
//
// At most one retry per call. Bearer-token clients never enter Refreshing.

use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Authenticator;
use crate::error::Error;
use crate::nonce::{Nonce, NonceRetrieval, NonceStore};
use crate::request::{ApiRequest, ApiResponse};

/// Header carrying the REST nonce on self-hosted requests.
pub const NONCE_HEADER: &str = "X-WP-Nonce";

/// Where a logical call currently stands.
#[derive(Debug)]
enum CallState {
    /// About to send (or re-send) the request.
    Send { retried: bool },
    /// First attempt was rejected; obtaining a fresh nonce.
    Refreshing { rejected: ApiResponse },
    Success(ApiResponse),
    Failed(Error),
}

/// Sends requests for one site, attaching credentials and recovering
/// from a stale or missing nonce with a single login + refresh + retry.
#[derive(Debug)]
pub struct Executor {
    http: reqwest::Client,
    authenticator: Authenticator,
    retrieval: NonceRetrieval,
    nonce: NonceStore,
}

impl Executor {
    pub fn new(http: reqwest::Client, authenticator: Authenticator) -> Self {
        Self {
            http,
            authenticator,
            retrieval: NonceRetrieval::default(),
            nonce: NonceStore::new(),
        }
    }

    /// Replace the nonce retrieval policy.
    pub fn with_retrieval(mut self, retrieval: NonceRetrieval) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn retrieval(&self) -> &NonceRetrieval {
        &self.retrieval
    }

    pub fn nonce_store(&self) -> &NonceStore {
        &self.nonce
    }

    /// Run one logical call against `url`.
    pub async fn execute(&self, request: &ApiRequest, url: &Url) -> Result<ApiResponse, Error> {
        let mut state = CallState::Send { retried: false };
        loop {
            state = match state {
                CallState::Send { retried } => self.send(request, url, retried).await,
                CallState::Refreshing { rejected } => self.refresh(rejected).await,
                CallState::Success(resp) => return Ok(resp),
                CallState::Failed(err) => return Err(err),
            };
        }
    }

    /// Run one logical call, giving up with `Error::Cancelled` as soon as
    /// `cancel` fires. Dropping the in-flight future aborts the HTTP request,
    /// and the nonce store is only written after a complete retrieval.
    pub async fn execute_cancellable(
        &self,
        request: &ApiRequest,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, Error> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("{} {url} cancelled", request.method());
                Err(Error::Cancelled)
            }
            result = self.execute(request, url) => result,
        }
    }

    /// Obtain a fresh nonce and cache it. Self-hosted clients only.
    pub async fn refresh_nonce(&self) -> Result<Nonce, Error> {
        let Authenticator::SiteCredentials(credential) = &self.authenticator else {
            return Err(Error::UnsupportedOperation(
                "bearer-token clients do not use nonces",
            ));
        };

        match self.retrieval.retrieve(credential, &self.http).await {
            Some(nonce) => {
                self.nonce.set(nonce.clone());
                Ok(nonce)
            }
            None => Err(Error::AuthenticationRequired {
                message: format!(
                    "could not obtain a REST nonce for {} at {}",
                    credential.username(),
                    credential.login_url()
                ),
            }),
        }
    }

    // ── State transitions ────────────────────────────────────────────

    async fn send(&self, request: &ApiRequest, url: &Url, retried: bool) -> CallState {
        debug!("{} {url}{}", request.method(), if retried { " (retry)" } else { "" });

        let builder = match self.authorize(request.to_builder(&self.http, url.clone())) {
            Ok(builder) => builder,
            Err(err) => return CallState::Failed(err),
        };

        let resp = match builder.send().await {
            Ok(resp) => resp,
            Err(e) => return CallState::Failed(Error::Transport(e)),
        };
        let resp = match ApiResponse::read(resp).await {
            Ok(resp) => resp,
            Err(e) => return CallState::Failed(Error::Transport(e)),
        };

        if resp.status().is_success() {
            return CallState::Success(resp);
        }

        let refreshable = matches!(self.authenticator, Authenticator::SiteCredentials(_));
        if resp.is_auth_rejection() && refreshable && !retried {
            debug!("HTTP {} from {url}, refreshing nonce", resp.status());
            return CallState::Refreshing { rejected: resp };
        }

        CallState::Failed(resp.into_endpoint_error())
    }

    async fn refresh(&self, rejected: ApiResponse) -> CallState {
        match self.refresh_nonce().await {
            Ok(_) => CallState::Send { retried: true },
            Err(Error::AuthenticationRequired { message }) => {
                warn!("nonce refresh failed after HTTP {}", rejected.status());
                CallState::Failed(Error::AuthenticationRequired { message })
            }
            Err(_) => CallState::Failed(rejected.into_endpoint_error()),
        }
    }

    /// Attach the bearer token, or the cached nonce if there is one.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        match &self.authenticator {
            Authenticator::Bearer(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|e| Error::InvalidHeader {
                        name: AUTHORIZATION.to_string(),
                        message: e.to_string(),
                    })?;
                value.set_sensitive(true);
                Ok(builder.header(AUTHORIZATION, value))
            }
            Authenticator::SiteCredentials(_) => Ok(match self.nonce.get() {
                Some(nonce) => builder.header(NONCE_HEADER, nonce.as_str()),
                None => builder,
            }),
        }
    }
}
