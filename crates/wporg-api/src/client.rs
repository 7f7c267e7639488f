// WordPress REST API client
//
// Resolves request paths against the site's API root and hands every
// call to the `Executor`, which owns authentication and the single
// nonce-refresh retry. Callers get a typed decode or a typed error.

use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::{AuthStrategy, Authenticator, SiteCredential, with_trailing_slash};
use crate::discovery::discover_api_root;
use crate::error::Error;
use crate::executor::Executor;
use crate::nonce::{Nonce, NonceRetrieval};
use crate::request::{ApiRequest, ApiResponse};
use crate::transport::TransportConfig;

/// Public API host serving wordpress.com-hosted sites.
pub const DOTCOM_API_ROOT: &str = "https://public-api.wordpress.com/";

/// Where REST paths are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiBase {
    /// A self-hosted site's API root, e.g. `https://example.com/wp-json/`
    /// or `https://example.com/?rest_route=/` on sites without pretty permalinks.
    SelfHosted(Url),
    /// wordpress.com proxy: `/wp/v2/posts` becomes `/wp/v2/sites/{id}/posts`.
    Dotcom { root: Url, site_id: u64 },
}

impl ApiBase {
    pub fn self_hosted(api_root: Url) -> Self {
        Self::SelfHosted(with_trailing_slash(api_root))
    }

    pub fn dotcom(site_id: u64) -> Result<Self, Error> {
        Ok(Self::dotcom_at(Url::parse(DOTCOM_API_ROOT)?, site_id))
    }

    /// wordpress.com-style base on a custom host (proxies, tests).
    pub fn dotcom_at(root: Url, site_id: u64) -> Self {
        Self::Dotcom {
            root: with_trailing_slash(root),
            site_id,
        }
    }

    pub fn root(&self) -> &Url {
        match self {
            Self::SelfHosted(root) | Self::Dotcom { root, .. } => root,
        }
    }

    /// Resolve a REST path (`/wp/v2/posts`, leading slash optional).
    pub fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        let path = path.trim_start_matches('/');
        match self {
            Self::SelfHosted(root) => join_rest_path(root, path),
            Self::Dotcom { root, site_id } => join_rest_path(root, &dotcom_path(path, *site_id)),
        }
    }
}

impl From<Url> for ApiBase {
    fn from(api_root: Url) -> Self {
        Self::self_hosted(api_root)
    }
}

/// Async client for one WordPress site's REST API.
#[derive(Debug)]
pub struct WordPressOrgRestApi {
    executor: Executor,
    base: ApiBase,
}

impl WordPressOrgRestApi {
    // ── Constructors ─────────────────────────────────────────────────

    /// Client for a self-hosted site, authenticated by username/password
    /// and REST nonce.
    ///
    /// A cookie jar is added to the transport if it has none: nonce
    /// retrieval only works on a cookie-bearing session.
    pub fn self_hosted(
        api_root: Url,
        credential: SiteCredential,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self::with_client(
            http,
            ApiBase::self_hosted(api_root),
            Authenticator::SiteCredentials(credential),
        ))
    }

    /// Client for a wordpress.com-hosted site, authenticated by bearer token.
    pub fn dotcom(
        site_id: u64,
        token: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            ApiBase::dotcom(site_id)?,
            Authenticator::Bearer(token),
        ))
    }

    /// Discover the API root of `site_url`, then build a self-hosted client
    /// sharing the session used for discovery.
    pub async fn discover(
        site_url: &Url,
        credential: SiteCredential,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        let api_root = discover_api_root(&http, site_url).await?;
        Ok(Self::with_client(
            http,
            ApiBase::SelfHosted(api_root),
            Authenticator::SiteCredentials(credential),
        ))
    }

    /// Wrap an existing `reqwest::Client`.
    ///
    /// For self-hosted sites the client must have a cookie store, or the
    /// login performed during nonce retrieval will not stick.
    pub fn with_client(
        http: reqwest::Client,
        base: impl Into<ApiBase>,
        authenticator: Authenticator,
    ) -> Self {
        Self {
            executor: Executor::new(http, authenticator),
            base: base.into(),
        }
    }

    /// Replace the nonce retrieval policy (default: ajax, then post-new scrape).
    pub fn with_retrieval(mut self, retrieval: NonceRetrieval) -> Self {
        self.executor = self.executor.with_retrieval(retrieval);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn base(&self) -> &ApiBase {
        &self.base
    }

    pub fn api_root(&self) -> &Url {
        self.base.root()
    }

    pub fn strategy(&self) -> AuthStrategy {
        self.executor.authenticator().strategy()
    }

    pub fn retrieval(&self) -> &NonceRetrieval {
        self.executor.retrieval()
    }

    /// The currently cached nonce, if any.
    pub fn nonce(&self) -> Option<Nonce> {
        self.executor.nonce_store().get()
    }

    /// Drop the cached nonce so the next call starts unauthenticated.
    pub fn forget_nonce(&self) {
        self.executor.nonce_store().clear();
    }

    /// Fetch and cache a fresh nonce without making an API call.
    pub async fn refresh_nonce(&self) -> Result<Nonce, Error> {
        self.executor.refresh_nonce().await
    }

    pub fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        self.base.endpoint_url(path)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Execute a request and return the raw response.
    pub async fn request_raw(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let url = self.endpoint_url(request.path())?;
        self.executor.execute(request, &url).await
    }

    /// Execute a request and decode the JSON body.
    pub async fn request<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, Error> {
        self.request_raw(request).await?.decode()
    }

    /// Like [`request`](Self::request), abandoning the call when `cancel` fires.
    pub async fn request_cancellable<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T, Error> {
        let url = self.endpoint_url(request.path())?;
        self.executor
            .execute_cancellable(request, &url, cancel)
            .await?
            .decode()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |req, (k, v)| req.query(*k, *v));
        self.request(&request).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.request(&ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.request(&ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let request = query
            .iter()
            .fold(ApiRequest::delete(path), |req, (k, v)| req.query(*k, *v));
        self.request(&request).await
    }
}

/// Join `path` onto `root`, honouring `?rest_route=` style roots.
fn join_rest_path(root: &Url, path: &str) -> Result<Url, Error> {
    if !root.query_pairs().any(|(k, _)| k == "rest_route") {
        return Ok(root.join(path)?);
    }

    let kept: Vec<(String, String)> = root
        .query_pairs()
        .filter(|(k, _)| k != "rest_route")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut url = root.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("rest_route", &format!("/{path}"));
    Ok(url)
}

/// `wp/v2/posts/7` → `wp/v2/sites/{id}/posts/7`.
fn dotcom_path(path: &str, site_id: u64) -> String {
    let mut parts = path.splitn(3, '/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(ns), Some(version), Some(rest)) if !rest.is_empty() => {
            format!("{ns}/{version}/sites/{site_id}/{rest}")
        }
        (Some(ns), Some(version), _) if !ns.is_empty() && !version.is_empty() => {
            format!("{ns}/{version}/sites/{site_id}")
        }
        _ => path.to_owned(),
    }
}
