//! Clap derive structures for the `wporg` CLI.
//!
//! Defines the command tree, global flags, and the small value parsers
//! they need. Kept free of crate-internal imports so `build.rs` can
//! include it to render man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wporg -- talk to a WordPress site's REST API from the command line
#[derive(Debug, Parser)]
#[command(
    name = "wporg",
    version,
    about = "Call the WordPress REST API from the command line",
    long_about = "Call the WordPress REST API from the command line.\n\n\
        Self-hosted sites are accessed with a username and password: wporg logs in,\n\
        obtains a REST nonce, and retries a rejected call once with a fresh nonce.\n\
        wordpress.com-hosted sites use an OAuth bearer token.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Site profile to use
    #[arg(long, short = 'p', env = "WPORG_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Site URL (overrides profile)
    #[arg(long, short = 's', env = "WPORG_SITE", global = true)]
    pub site: Option<String>,

    /// REST API root, e.g. https://example.com/wp-json/ (skips discovery)
    #[arg(long, env = "WPORG_API_ROOT", global = true)]
    pub api_root: Option<String>,

    /// Login username for self-hosted sites
    #[arg(long, short = 'u', env = "WPORG_USERNAME", global = true)]
    pub username: Option<String>,

    /// Login password for self-hosted sites
    #[arg(long, env = "WPORG_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// OAuth bearer token for wordpress.com-hosted sites
    #[arg(long, env = "WPORG_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// wordpress.com site ID (used with --token)
    #[arg(long, env = "WPORG_SITE_ID", global = true)]
    pub site_id: Option<u64>,

    /// How to obtain a REST nonce (overrides profile)
    #[arg(long, value_enum, global = true)]
    pub nonce_method: Option<NonceMethod>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WPORG_OUTPUT",
        default_value = "json",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "WPORG_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "WPORG_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Enums ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Table of the scalar fields of each item
    Table,
    /// Plain text, one id or value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NonceMethod {
    /// admin-ajax.php first, then the editor page
    Auto,
    /// admin-ajax.php?action=rest-nonce only
    Ajax,
    /// Scrape wp-admin/post-new.php only
    Scrape,
}

impl NonceMethod {
    /// Name used for `nonce_method` in profiles.
    pub fn as_config_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Ajax => "ajax",
            Self::Scrape => "scrape",
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// GET a REST path, e.g. `wporg get /wp/v2/posts -q per_page=5`
    Get(RequestArgs),

    /// POST to a REST path with a JSON or form body
    Post(BodyArgs),

    /// PUT to a REST path with a JSON or form body
    Put(BodyArgs),

    /// DELETE a REST path
    #[command(alias = "rm")]
    Delete(RequestArgs),

    /// Log in and print a fresh REST nonce
    Nonce,

    /// Find the REST API root of a site
    Discover(DiscoverArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Request Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// REST path relative to the API root, e.g. /wp/v2/posts
    pub path: String,

    /// Query parameter (repeatable)
    #[arg(long = "query", short = 'q', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,

    /// Extra request header (repeatable)
    #[arg(long = "header", short = 'H', value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct BodyArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// JSON body: inline JSON, @file, or - for stdin
    #[arg(long, conflicts_with = "form")]
    pub json: Option<String>,

    /// Form field (repeatable)
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub form: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Site front-end URL, e.g. https://example.com
    pub site: String,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key, e.g. site, username, nonce_method
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's password or token in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

/// Parse `key=value`. The value may be empty and may contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Parse `Name: value`.
pub fn parse_header(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(format!("expected NAME:VALUE, got '{s}'")),
    }
}
