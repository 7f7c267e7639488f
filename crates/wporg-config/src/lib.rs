//! Configuration for the `wporg` client.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation into a connectable [`SiteConfig`]. The CLI layers
//! its `GlobalOpts` flag overrides on top of this.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use wporg_api::{
    ApiBase, Authenticator, NonceRetrieval, RetrievalMethod, SiteCredential, TlsMode, TransportConfig, WordPressOrgRestApi,
};

/// Service name under which secrets are stored in the system keyring.
pub const KEYRING_SERVICE: &str = "wporg";

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "WPORG_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] wporg_api::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named site profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "json".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named site profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Site front-end URL (e.g., "https://example.com").
    pub site: String,

    /// REST API root. Discovered from the site when absent.
    pub api_root: Option<String>,

    /// Override for `<site>/wp-login.php`.
    pub login_url: Option<String>,

    /// Override for `<site>/wp-admin/`.
    pub admin_url: Option<String>,

    /// Auth mode: "self-hosted" or "dotcom".
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,

    /// Nonce retrieval: "auto", "ajax", or "scrape".
    #[serde(default = "default_nonce_method")]
    pub nonce_method: String,

    /// Username for self-hosted login.
    pub username: Option<String>,

    /// Password for self-hosted login (plaintext, prefer keyring).
    pub password: Option<String>,

    /// OAuth bearer token for wordpress.com (plaintext, prefer keyring).
    pub token: Option<String>,

    /// Environment variable name containing the bearer token.
    pub token_env: Option<String>,

    /// wordpress.com numeric site ID.
    pub site_id: Option<u64>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

impl Profile {
    /// A self-hosted profile with every optional field unset.
    pub fn for_site(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            api_root: None,
            login_url: None,
            admin_url: None,
            auth_mode: default_auth_mode(),
            nonce_method: default_nonce_method(),
            username: None,
            password: None,
            token: None,
            token_env: None,
            site_id: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_auth_mode() -> String {
    "self-hosted".into()
}
fn default_nonce_method() -> String {
    "auto".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$WPORG_CONFIG`, else XDG / platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "wporg", "wporg").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wporg");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, with `WPORG_`-prefixed env vars layered on top
/// (`WPORG_DEFAULT_PROFILE`, `WPORG_DEFAULTS__TIMEOUT`, ...).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WPORG_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
/// An invalid file is reported with a warning rather than dropped silently.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        warn!(path = %config_path().display(), error = %e, "ignoring unreadable config");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Keyring account for the self-hosted login password of a profile.
pub fn password_account(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Keyring account for the wordpress.com bearer token of a profile.
pub fn token_account(profile_name: &str) -> String {
    format!("{profile_name}/token")
}

fn keyring_secret(account: &str) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account).ok()?;
    match entry.get_password() {
        Ok(secret) => Some(secret),
        Err(e) => {
            debug!("no keyring secret for {account}: {e}");
            None
        }
    }
}

/// Store a secret in the system keyring.
pub fn store_secret(account: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, account)
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// First secret found, in order: environment, keyring, plaintext config.
fn first_secret(
    env: Option<String>,
    keyring: impl FnOnce() -> Option<String>,
    plaintext: Option<&String>,
) -> Option<SecretString> {
    env.or_else(keyring)
        .or_else(|| plaintext.cloned())
        .map(SecretString::from)
}

/// Resolve the self-hosted username: profile, then `WPORG_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("WPORG_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the self-hosted password: `WPORG_PASSWORD`, keyring, plaintext.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    first_secret(
        std::env::var("WPORG_PASSWORD").ok(),
        || keyring_secret(&password_account(profile_name)),
        profile.password.as_ref(),
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the wordpress.com bearer token: the profile's `token_env`
/// (or `WPORG_TOKEN`), keyring, plaintext.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    let env_name = profile.token_env.as_deref().unwrap_or("WPORG_TOKEN");
    first_secret(
        std::env::var(env_name).ok(),
        || keyring_secret(&token_account(profile_name)),
        profile.token.as_ref(),
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Parse a profile's `nonce_method`.
pub fn parse_nonce_method(value: &str) -> Result<NonceRetrieval, ConfigError> {
    match value {
        "auto" => Ok(NonceRetrieval::default()),
        "ajax" => Ok(NonceRetrieval::Preferred(RetrievalMethod::AjaxNonceRequest)),
        "scrape" => Ok(NonceRetrieval::Preferred(RetrievalMethod::NewPostScrap)),
        other => Err(ConfigError::Validation {
            field: "nonce_method".into(),
            reason: format!("expected 'auto', 'ajax', or 'scrape', got '{other}'"),
        }),
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    value.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {value}"),
    })
}

// ── Site config ─────────────────────────────────────────────────────

/// How a resolved profile authenticates.
#[derive(Debug, Clone)]
pub enum SiteAuth {
    SelfHosted {
        credential: SiteCredential,
        retrieval: NonceRetrieval,
    },
    Dotcom {
        site_id: u64,
        token: SecretString,
    },
}

/// Everything needed to build a [`WordPressOrgRestApi`] for one profile.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site: Url,
    pub api_root: Option<Url>,
    pub auth: SiteAuth,
    pub transport: TransportConfig,
}

impl SiteConfig {
    /// Build the client, discovering the API root if none is configured.
    pub async fn connect(self) -> Result<WordPressOrgRestApi, wporg_api::Error> {
        match self.auth {
            SiteAuth::Dotcom { site_id, token } => match self.api_root {
                Some(root) => Ok(WordPressOrgRestApi::with_client(
                    self.transport.build_client()?,
                    ApiBase::dotcom_at(root, site_id),
                    Authenticator::Bearer(token),
                )),
                None => WordPressOrgRestApi::dotcom(site_id, token, &self.transport),
            },
            SiteAuth::SelfHosted {
                credential,
                retrieval,
            } => {
                let client = match self.api_root {
                    Some(root) => {
                        WordPressOrgRestApi::self_hosted(root, credential, &self.transport)?
                    }
                    None => {
                        WordPressOrgRestApi::discover(&self.site, credential, &self.transport)
                            .await?
                    }
                };
                Ok(client.with_retrieval(retrieval))
            }
        }
    }
}

/// Build a `SiteConfig` from a profile, no CLI flag overrides.
pub fn profile_to_site_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SiteConfig, ConfigError> {
    let site = parse_url("site", &profile.site)?;
    let api_root = profile
        .api_root
        .as_deref()
        .map(|root| parse_url("api_root", root))
        .transpose()?;

    let auth = match profile.auth_mode.as_str() {
        "self-hosted" => {
            let username = resolve_username(profile, profile_name)?;
            let password = resolve_password(profile, profile_name)?;
            let mut credential = SiteCredential::for_site(&site, username, password)?;
            if profile.login_url.is_some() || profile.admin_url.is_some() {
                let login_url = match profile.login_url.as_deref() {
                    Some(u) => parse_url("login_url", u)?,
                    None => credential.login_url().clone(),
                };
                let admin_url = match profile.admin_url.as_deref() {
                    Some(u) => parse_url("admin_url", u)?,
                    None => credential.admin_url().clone(),
                };
                credential = SiteCredential::new(
                    login_url,
                    credential.username().to_owned(),
                    credential.password().clone(),
                    admin_url,
                );
            }
            SiteAuth::SelfHosted {
                credential,
                retrieval: parse_nonce_method(&profile.nonce_method)?,
            }
        }
        "dotcom" => {
            let site_id = profile.site_id.ok_or_else(|| ConfigError::Validation {
                field: "site_id".into(),
                reason: "required when auth_mode is 'dotcom'".into(),
            })?;
            SiteAuth::Dotcom {
                site_id,
                token: resolve_token(profile, profile_name)?,
            }
        }
        other => {
            return Err(ConfigError::Validation {
                field: "auth_mode".into(),
                reason: format!("expected 'self-hosted' or 'dotcom', got '{other}'"),
            });
        }
    };

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let transport = TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        ..TransportConfig::default()
    };

    Ok(SiteConfig {
        site,
        api_root,
        auth,
        transport,
    })
}
