//! CLI error types with miette diagnostics.
//!
//! Maps `wporg_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use wporg_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(wporg::connection_failed),
        help(
            "Check that the site is up and reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(wporg::tls_error),
        help(
            "For a self-signed certificate use --insecure (-k),\n\
             or configure ca_cert in your profile."
        )
    )]
    TlsError { message: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(wporg::timeout),
        help("Increase timeout with --timeout or check the site's responsiveness.")
    )]
    Timeout { url: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(wporg::auth_failed),
        help(
            "Verify the username and password (or token).\n\
             Store a new one with: wporg config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(wporg::no_credentials),
        help(
            "Configure credentials with: wporg config init\n\
             Or set WPORG_USERNAME and WPORG_PASSWORD (WPORG_TOKEN for wordpress.com)."
        )
    )]
    NoCredentials { profile: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Not found: {message}")]
    #[diagnostic(code(wporg::not_found))]
    NotFound { message: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(wporg::permission_denied),
        help("The account is logged in but lacks the capability for this request.")
    )]
    PermissionDenied { message: String },

    #[error("API error (HTTP {status}, {code}): {message}")]
    #[diagnostic(code(wporg::api_error))]
    ApiError {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(wporg::invalid_response),
        help("The site answered with something other than JSON. Check --api-root.")
    )]
    InvalidResponse { message: String },

    #[error("No WordPress REST API found at {url}")]
    #[diagnostic(
        code(wporg::api_root_not_found),
        help("Pass the API root explicitly with --api-root, e.g. {url}wp-json/")
    )]
    ApiRootNotFound { url: String },

    #[error("Operation '{operation}' is not supported with the current auth mode")]
    #[diagnostic(code(wporg::unsupported))]
    Unsupported { operation: String },

    #[error("Interrupted")]
    #[diagnostic(code(wporg::interrupted))]
    Cancelled,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(wporg::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(wporg::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: wporg config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No site configured")]
    #[diagnostic(
        code(wporg::no_config),
        help(
            "Create a profile with: wporg config init\n\
             Or pass --site. Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(wporg::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(wporg::json), help("Check the JSON body and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ApiRootNotFound { .. } => exit_code::NOT_FOUND,
            Self::PermissionDenied { .. } | Self::Unsupported { .. } => exit_code::PERMISSION,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            Self::Cancelled => exit_code::INTERRUPTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── wporg_api::Error → CliError mapping ──────────────────────────────

impl From<wporg_api::Error> for CliError {
    fn from(err: wporg_api::Error) -> Self {
        use wporg_api::Error as E;

        match err {
            E::Transport(e) => {
                let url = e.url().map_or_else(|| "(unknown)".into(), ToString::to_string);
                if e.is_timeout() {
                    CliError::Timeout { url }
                } else {
                    CliError::ConnectionFailed {
                        url,
                        source: Box::new(e),
                    }
                }
            }

            E::AuthenticationRequired { message } => CliError::AuthFailed { message },

            E::Endpoint {
                status: 401,
                message,
                ..
            } => CliError::AuthFailed { message },

            E::Endpoint {
                status: 403,
                message,
                ..
            } => CliError::PermissionDenied { message },

            E::Endpoint {
                status: 404,
                message,
                ..
            } => CliError::NotFound { message },

            E::Endpoint {
                status,
                code,
                message,
                ..
            } => CliError::ApiError {
                status,
                code: code.unwrap_or_else(|| "http_error".into()),
                message,
            },

            E::Deserialization { message, .. } => CliError::InvalidResponse { message },

            E::InvalidUrl(e) => CliError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },

            E::Tls(message) => CliError::TlsError { message },

            E::InvalidHeader { name, message } => CliError::Validation {
                field: name,
                reason: message,
            },

            E::Cancelled => CliError::Cancelled,

            E::ApiRootNotFound { url } => CliError::ApiRootNotFound { url },

            E::Encode(e) => CliError::Json(e),

            E::UnsupportedOperation(operation) => CliError::Unsupported {
                operation: operation.into(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(unknown)".into(),
            },
            ConfigError::Api(e) => e.into(),
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(status: u16) -> wporg_api::Error {
        wporg_api::Error::Endpoint {
            status,
            code: Some("rest_error".into()),
            message: "nope".into(),
            body: String::new(),
        }
    }

    #[test]
    fn endpoint_statuses_map_to_exit_codes() {
        assert_eq!(CliError::from(endpoint(401)).exit_code(), exit_code::AUTH);
        assert_eq!(CliError::from(endpoint(403)).exit_code(), exit_code::PERMISSION);
        assert_eq!(CliError::from(endpoint(404)).exit_code(), exit_code::NOT_FOUND);
        assert_eq!(CliError::from(endpoint(500)).exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn refresh_failure_is_auth_error() {
        let err = CliError::from(wporg_api::Error::AuthenticationRequired {
            message: "no nonce".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert!(err.to_string().contains("no nonce"));
    }

    #[test]
    fn config_errors_keep_their_meaning() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "blog".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);

        let err = CliError::from(ConfigError::Validation {
            field: "site".into(),
            reason: "bad".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn cancelled_and_missing_root() {
        assert_eq!(
            CliError::from(wporg_api::Error::Cancelled).exit_code(),
            exit_code::INTERRUPTED
        );
        assert_eq!(
            CliError::from(wporg_api::Error::ApiRootNotFound {
                url: "https://site.test/".into()
            })
            .exit_code(),
            exit_code::NOT_FOUND
        );
    }
}
