//! CLI configuration -- thin wrapper around `wporg_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--site, --username, --password, ...) on top of the stored profile.

use secrecy::SecretString;

use wporg_api::SiteCredential;
use wporg_config::{SiteAuth, SiteConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use wporg_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Apply flag overrides to a profile. Flags win over stored values.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref site) = global.site {
        profile.site.clone_from(site);
    }
    if let Some(ref root) = global.api_root {
        profile.api_root = Some(root.clone());
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if let Some(ref password) = global.password {
        profile.password = Some(password.clone());
    }
    if let Some(ref token) = global.token {
        profile.token = Some(token.clone());
    }
    if let Some(site_id) = global.site_id {
        profile.site_id = Some(site_id);
    }
    if let Some(method) = global.nonce_method {
        profile.nonce_method = method.as_config_str().into();
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

/// Build a `SiteConfig` from the config file, profile, and CLI overrides.
pub fn build_site_config(global: &GlobalOpts) -> Result<SiteConfig, CliError> {
    let cfg = wporg_config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        // No profile -- build from CLI flags / env vars alone
        None => {
            let site = global.site.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let mut profile = Profile::for_site(site);
            if global.token.is_some() && global.username.is_none() {
                profile.auth_mode = "dotcom".into();
            }
            profile
        }
    };
    apply_overrides(&mut profile, global);

    let mut site = wporg_config::profile_to_site_config(&profile, &profile_name, &cfg.defaults)?;
    override_secrets(&mut site, global);
    Ok(site)
}

/// Explicit --password / --token beat the keyring.
fn override_secrets(site: &mut SiteConfig, global: &GlobalOpts) {
    match &mut site.auth {
        SiteAuth::SelfHosted { credential, .. } => {
            if let Some(ref password) = global.password {
                *credential = SiteCredential::new(
                    credential.login_url().clone(),
                    credential.username().to_owned(),
                    SecretString::from(password.clone()),
                    credential.admin_url().clone(),
                );
            }
        }
        SiteAuth::Dotcom { token, .. } => {
            if let Some(ref value) = global.token {
                *token = SecretString::from(value.clone());
            }
        }
    }
}
