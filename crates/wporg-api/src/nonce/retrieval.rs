// Nonce retrieval strategies
//
// Both strategies first try their nonce endpoint with whatever session
// cookies the client already holds, then log in through `wp-login.php`
// (with `redirect_to` pointing at the nonce endpoint) and read the nonce
// from the authenticated session. Any failure collapses to `None` and
// the executor decides what that means.

use std::slice;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use tracing::{debug, trace};
use url::Url;

use crate::auth::SiteCredential;
use crate::nonce::store::Nonce;

/// `wp.apiFetch.use( wp.apiFetch.createNonceMiddleware( "0123abcdef" ) );`
/// as printed inline by the block editor on `post-new.php`.
static NONCE_MIDDLEWARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"apiFetch\.createNonceMiddleware\(\s*['"](?P<nonce>[A-Za-z0-9_-]+)['"]\s*\)"#)
        .expect("nonce middleware pattern is valid")
});

/// `var wpApiSettings = {"root":"…","nonce":"0123abcdef",…};`
static API_SETTINGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"wpApiSettings\s*=\s*\{[^}]*?"nonce"\s*:\s*"(?P<nonce>[A-Za-z0-9_-]+)""#)
        .expect("wpApiSettings pattern is valid")
});

/// A way of obtaining a fresh nonce from an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrievalMethod {
    /// Scrape the inline editor bootstrap script on `wp-admin/post-new.php`.
    NewPostScrap,
    /// Ask `wp-admin/admin-ajax.php?action=rest-nonce`, which answers with
    /// the bare nonce as its body.
    AjaxNonceRequest,
}

impl RetrievalMethod {
    /// The admin endpoint this method reads its nonce from.
    pub fn nonce_url(self, admin_url: &Url) -> Result<Url, url::ParseError> {
        match self {
            Self::NewPostScrap => admin_url.join("post-new.php"),
            Self::AjaxNonceRequest => admin_url.join("admin-ajax.php?action=rest-nonce"),
        }
    }

    /// Pull a nonce out of an endpoint response.
    pub fn extract(self, status: StatusCode, body: &str) -> Option<Nonce> {
        match self {
            Self::NewPostScrap => {
                if !status.is_success() {
                    return None;
                }
                scrape_nonce(body)
            }
            Self::AjaxNonceRequest => {
                if status != StatusCode::OK {
                    return None;
                }
                let body = body.trim();
                // `admin-ajax.php` prints `0` / `-1` for logged-out callers.
                if matches!(body, "0" | "-1") || !body.chars().all(is_token_char) {
                    return None;
                }
                Nonce::parse(body)
            }
        }
    }

    /// Obtain a nonce for `credential`, logging in if the session needs it.
    pub async fn retrieve_nonce(
        self,
        credential: &SiteCredential,
        http: &reqwest::Client,
    ) -> Option<Nonce> {
        let nonce_url = match self.nonce_url(credential.admin_url()) {
            Ok(url) => url,
            Err(e) => {
                debug!(method = ?self, "cannot build nonce URL: {e}");
                return None;
            }
        };

        // 1. Existing session cookies may already be enough.
        if let Some(nonce) = self.fetch(http, &nonce_url).await {
            debug!(method = ?self, "nonce retrieved with existing session");
            return Some(nonce);
        }

        // 2. Log in, landing on the nonce endpoint via `redirect_to`.
        debug!(method = ?self, "logging in at {}", credential.login_url());
        let form = [
            ("log", credential.username()),
            ("pwd", credential.password().expose_secret()),
            ("rememberme", "true"),
            ("redirect_to", nonce_url.as_str()),
        ];
        let resp = match http
            .post(credential.login_url().clone())
            .form(&form)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                debug!(method = ?self, "login request failed: {e}");
                return None;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            debug!(method = ?self, "login failed (HTTP {status})");
            return None;
        }

        // 3. Read the nonce from wherever the login landed, or ask again.
        let nonce = if same_endpoint(resp.url(), &nonce_url) {
            self.read(resp).await
        } else {
            trace!(method = ?self, "login landed on {}, requesting nonce", resp.url());
            self.fetch(http, &nonce_url).await
        };

        if nonce.is_none() {
            debug!(method = ?self, "no nonce after login");
        }
        nonce
    }

    async fn fetch(self, http: &reqwest::Client, url: &Url) -> Option<Nonce> {
        trace!(method = ?self, "GET {url}");
        match http.get(url.clone()).send().await {
            Ok(resp) => self.read(resp).await,
            Err(e) => {
                debug!(method = ?self, "nonce request failed: {e}");
                None
            }
        }
    }

    async fn read(self, resp: reqwest::Response) -> Option<Nonce> {
        let status = resp.status();
        let body = resp.text().await.ok()?;
        self.extract(status, &body)
    }
}

/// Which methods to try, in order, when a nonce is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonceRetrieval {
    /// Only ever use this method.
    Preferred(RetrievalMethod),
    /// Try each method in turn; the first nonce wins.
    FallbackChain(Vec<RetrievalMethod>),
}

impl Default for NonceRetrieval {
    fn default() -> Self {
        Self::FallbackChain(vec![
            RetrievalMethod::AjaxNonceRequest,
            RetrievalMethod::NewPostScrap,
        ])
    }
}

impl NonceRetrieval {
    pub fn methods(&self) -> &[RetrievalMethod] {
        match self {
            Self::Preferred(method) => slice::from_ref(method),
            Self::FallbackChain(methods) => methods,
        }
    }

    /// Run the configured methods in order, returning the first nonce found.
    pub async fn retrieve(
        &self,
        credential: &SiteCredential,
        http: &reqwest::Client,
    ) -> Option<Nonce> {
        for method in self.methods() {
            if let Some(nonce) = method.retrieve_nonce(credential, http).await {
                return Some(nonce);
            }
            debug!(method = ?method, "nonce retrieval failed");
        }
        None
    }
}

/// Find a nonce literal in an admin page. Never fails on malformed markup.
pub fn scrape_nonce(html: &str) -> Option<Nonce> {
    [&*NONCE_MIDDLEWARE_RE, &*API_SETTINGS_RE]
        .into_iter()
        .find_map(|re| re.captures(html))
        .and_then(|caps| caps.name("nonce"))
        .and_then(|m| Nonce::parse(m.as_str()))
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn same_endpoint(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
        && a.path() == b.path()
        && a.query() == b.query()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const EDITOR_PAGE: &str = r#"<html><head>
<script type="text/javascript" id="wp-api-fetch-js-after">
wp.apiFetch.use( wp.apiFetch.createRootURLMiddleware( "https://site.test/wp-json/" ) );
wp.apiFetch.nonceMiddleware = wp.apiFetch.createNonceMiddleware( "4f1a2b3c4d" );
wp.apiFetch.use( wp.apiFetch.nonceMiddleware );
</script></head><body></body></html>"#;

    fn admin() -> Url {
        Url::parse("https://site.test/wp-admin/").expect("url")
    }

    #[test]
    fn nonce_urls_live_under_admin() {
        assert_eq!(
            RetrievalMethod::NewPostScrap.nonce_url(&admin()).expect("url").as_str(),
            "https://site.test/wp-admin/post-new.php"
        );
        assert_eq!(
            RetrievalMethod::AjaxNonceRequest
                .nonce_url(&admin())
                .expect("url")
                .as_str(),
            "https://site.test/wp-admin/admin-ajax.php?action=rest-nonce"
        );
    }

    #[test]
    fn scrapes_nonce_middleware_call() {
        assert_eq!(scrape_nonce(EDITOR_PAGE).map(|n| n.to_string()), Some("4f1a2b3c4d".into()));
    }

    #[test]
    fn scrape_ignores_non_ascii_tokens() {
        assert_eq!(scrape_nonce(r#"wp.apiFetch.createNonceMiddleware( "abcé12" )"#), None);
        assert_eq!(scrape_nonce(r#"var wpApiSettings = {"nonce":"ñonce1"};"#), None);
    }

    #[test]
    fn scrapes_single_quoted_call() {
        let html = "wp.apiFetch.createNonceMiddleware('abc123')";
        assert_eq!(scrape_nonce(html).map(|n| n.to_string()), Some("abc123".into()));
    }

    #[test]
    fn scrapes_api_settings_object() {
        let html = r#"<script>var wpApiSettings = {"root":"https:\/\/site.test\/wp-json\/","nonce":"9e8d7c6b5a","versionString":"wp\/v2\/"};</script>"#;
        assert_eq!(scrape_nonce(html).map(|n| n.to_string()), Some("9e8d7c6b5a".into()));
    }

    #[test]
    fn malformed_markup_yields_nothing() {
        assert!(scrape_nonce("").is_none());
        assert!(scrape_nonce("<html><script>createNonceMiddleware(</html").is_none());
        assert!(scrape_nonce("wp.apiFetch.createNonceMiddleware( \"\" )").is_none());
        assert!(scrape_nonce("\u{0}\u{fffd}<<<>>>").is_none());
    }

    #[test]
    fn scrape_requires_success_status() {
        assert!(
            RetrievalMethod::NewPostScrap
                .extract(StatusCode::FORBIDDEN, EDITOR_PAGE)
                .is_none()
        );
    }

    #[test]
    fn ajax_body_is_the_nonce() {
        let nonce = RetrievalMethod::AjaxNonceRequest.extract(StatusCode::OK, "fakenonce\n");
        assert_eq!(nonce.map(|n| n.to_string()), Some("fakenonce".into()));
    }

    #[test]
    fn ajax_rejects_logged_out_markers_and_non_200() {
        let m = RetrievalMethod::AjaxNonceRequest;
        assert!(m.extract(StatusCode::OK, "0").is_none());
        assert!(m.extract(StatusCode::OK, "-1").is_none());
        assert!(m.extract(StatusCode::OK, "").is_none());
        assert!(m.extract(StatusCode::BAD_REQUEST, "fakenonce").is_none());
        assert!(m.extract(StatusCode::CREATED, "fakenonce").is_none());
        assert!(m.extract(StatusCode::OK, "<html>login</html>").is_none());
    }

    #[test]
    fn default_retrieval_prefers_ajax_then_scrape() {
        assert_eq!(
            NonceRetrieval::default().methods(),
            &[RetrievalMethod::AjaxNonceRequest, RetrievalMethod::NewPostScrap]
        );
        assert_eq!(
            NonceRetrieval::Preferred(RetrievalMethod::NewPostScrap).methods(),
            &[RetrievalMethod::NewPostScrap]
        );
    }

    #[test]
    fn same_endpoint_compares_path_and_query() {
        let a = Url::parse("https://site.test/wp-admin/admin-ajax.php?action=rest-nonce").expect("url");
        let b = Url::parse("https://site.test:443/wp-admin/admin-ajax.php?action=rest-nonce").expect("url");
        let c = Url::parse("https://site.test/wp-admin/").expect("url");
        assert!(same_endpoint(&a, &b));
        assert!(!same_endpoint(&a, &c));
    }
}
