//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

/// Keys accepted by `wporg config set`.
const SETTABLE_KEYS: &str = "site, api_root, login_url, admin_url, auth_mode, nonce_method, \
     username, password, token, token_env, site_id, insecure, timeout, ca_cert";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "site = \"{}\"", p.site);
        let _ = writeln!(out, "auth_mode = \"{}\"", p.auth_mode);
        let _ = writeln!(out, "nonce_method = \"{}\"", p.nonce_method);
        for (key, value) in [
            ("api_root", &p.api_root),
            ("login_url", &p.login_url),
            ("admin_url", &p.admin_url),
            ("username", &p.username),
            ("token_env", &p.token_env),
        ] {
            if let Some(v) = value {
                let _ = writeln!(out, "{key} = \"{v}\"");
            }
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if p.token.is_some() {
            let _ = writeln!(out, "token = \"****\"");
        }
        if let Some(id) = p.site_id {
            let _ = writeln!(out, "site_id = {id}");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// A copy of the config with plaintext secrets masked, for structured output.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("****".into());
        }
        if profile.token.is_some() {
            profile.token = Some("****".into());
        }
    }
    cfg
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_flag<T: std::str::FromStr>(
    field: &str,
    value: &str,
    expected: &str,
) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(
    secret: &str,
    account: &str,
    prompt: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(prompt)
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        wporg_config::store_secret(account, secret)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

/// Set one profile key from its string form.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "site" => profile.site = value,
        "api_root" | "api-root" => profile.api_root = Some(value),
        "login_url" | "login-url" => profile.login_url = Some(value),
        "admin_url" | "admin-url" => profile.admin_url = Some(value),
        "auth_mode" | "auth-mode" => {
            if !matches!(value.as_str(), "self-hosted" | "dotcom") {
                return Err(CliError::Validation {
                    field: "auth_mode".into(),
                    reason: "must be 'self-hosted' or 'dotcom'".into(),
                });
            }
            profile.auth_mode = value;
        }
        "nonce_method" | "nonce-method" => {
            wporg_config::parse_nonce_method(&value)?;
            profile.nonce_method = value;
        }
        "username" => profile.username = Some(value),
        "password" => profile.password = Some(value),
        "token" => profile.token = Some(value),
        "token_env" | "token-env" => profile.token_env = Some(value),
        "site_id" | "site-id" => {
            profile.site_id = Some(parse_flag("site_id", &value, "a number")?);
        }
        "insecure" => {
            profile.insecure = Some(parse_flag("insecure", &value, "'true' or 'false'")?);
        }
        "timeout" => {
            profile.timeout = Some(parse_flag("timeout", &value, "a number (seconds)")?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = match global.output {
                OutputFormat::Plain | OutputFormat::Table => format_config_redacted(&cfg),
                format => output::render_single(format, &cfg, format_config_redacted, |_| {
                    "config".into()
                }),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::for_site(String::new()));
            set_profile_key(profile, &key, value)?;

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: wporg config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let prof = cfg
                .profiles
                .get(&profile_name)
                .ok_or_else(|| CliError::ProfileNotFound {
                    name: profile_name.clone(),
                    available: config::available_profiles(&cfg),
                })?;

            let (account, label) = if prof.auth_mode == "dotcom" {
                (wporg_config::token_account(&profile_name), "Token: ")
            } else {
                (wporg_config::password_account(&profile_name), "Password: ")
            };

            let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "secret".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            wporg_config::store_secret(&account, &secret)?;

            eprintln!("✓ Secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

/// Interactive wizard writing a fresh config with one profile.
fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("wporg configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Site URL
    let site: String = Input::new()
        .with_prompt("Site URL")
        .default("https://example.com".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 3. Auth mode
    let auth_choices = &[
        "Username/Password (self-hosted WordPress)",
        "OAuth token (wordpress.com)",
    ];
    let auth_selection = Select::new()
        .with_prompt("Authentication method")
        .items(auth_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let mut profile = Profile::for_site(site);

    if auth_selection == 0 {
        let user: String = Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(prompt_err)?;
        let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
        if user.is_empty() || pass.is_empty() {
            return Err(CliError::Validation {
                field: "credentials".into(),
                reason: "username and password cannot be empty".into(),
            });
        }

        profile.username = Some(user);
        profile.password = prompt_keyring_storage(
            &pass,
            &wporg_config::password_account(&profile_name),
            "Where to store the password?",
            "Password",
        )?;
    } else {
        let site_id: u64 = Input::new()
            .with_prompt("wordpress.com site ID")
            .interact_text()
            .map_err(prompt_err)?;
        let token = rpassword::prompt_password("Token: ").map_err(prompt_err)?;
        if token.is_empty() {
            return Err(CliError::Validation {
                field: "token".into(),
                reason: "token cannot be empty".into(),
            });
        }

        profile.auth_mode = "dotcom".into();
        profile.site_id = Some(site_id);
        profile.token = prompt_keyring_storage(
            &token,
            &wporg_config::token_account(&profile_name),
            "Where to store the token?",
            "Token",
        )?;
    }

    // 4. Build and write config
    let mut profiles = HashMap::new();
    profiles.insert(profile_name.clone(), profile);

    let cfg = Config {
        default_profile: Some(profile_name.clone()),
        defaults: Defaults::default(),
        profiles,
    };
    save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: wporg nonce");

    Ok(())
}
