use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// Which authentication strategy a client uses.
///
/// Marker enum (no data) -- the actual secrets live in [`Authenticator`].
/// Useful for branching on auth flow without carrying secret material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Cookie session + `X-WP-Nonce` (self-hosted sites).
    Nonce,
    /// `Authorization: Bearer` (wordpress.com-hosted sites).
    Bearer,
}

/// Credentials for a self-hosted WordPress site.
///
/// Immutable once built. The password is a [`SecretString`], so `Debug`
/// output never reveals it.
#[derive(Debug, Clone)]
pub struct SiteCredential {
    login_url: Url,
    username: String,
    password: SecretString,
    admin_url: Url,
}

impl SiteCredential {
    pub fn new(login_url: Url, username: String, password: SecretString, admin_url: Url) -> Self {
        Self {
            login_url,
            username,
            password,
            admin_url: with_trailing_slash(admin_url),
        }
    }

    /// Derive the standard `wp-login.php` and `wp-admin/` URLs from a site root.
    ///
    /// `https://example.com/blog` → `https://example.com/blog/wp-login.php`
    /// and `https://example.com/blog/wp-admin/`.
    pub fn for_site(site_url: &Url, username: String, password: SecretString) -> Result<Self, Error> {
        let root = with_trailing_slash(site_url.clone());
        let login_url = root.join("wp-login.php")?;
        let admin_url = root.join("wp-admin/")?;
        Ok(Self::new(login_url, username, password, admin_url))
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// The `wp-admin/` URL, always with a trailing slash so relative joins
    /// (`post-new.php`, `admin-ajax.php`) land inside it.
    pub fn admin_url(&self) -> &Url {
        &self.admin_url
    }
}

/// How a REST client authenticates its requests.
#[derive(Debug, Clone)]
pub enum Authenticator {
    /// Self-hosted site: cookie login + nonce, refreshed on 401/403.
    SiteCredentials(SiteCredential),
    /// wordpress.com-hosted site: OAuth bearer token. Never refreshed.
    Bearer(SecretString),
}

impl Authenticator {
    pub fn strategy(&self) -> AuthStrategy {
        match self {
            Self::SiteCredentials(_) => AuthStrategy::Nonce,
            Self::Bearer(_) => AuthStrategy::Bearer,
        }
    }
}

pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
