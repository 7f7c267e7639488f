//! Shared helpers for command handlers.

use std::io::Read;

use crate::error::CliError;

/// Parse a `--json` argument: inline JSON, `@path` to a file, or `-` for stdin.
pub fn read_json_arg(arg: &str) -> Result<serde_json::Value, CliError> {
    let contents = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else if let Some(path) = arg.strip_prefix('@') {
        std::fs::read_to_string(path)?
    } else {
        arg.to_owned()
    };

    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "json".into(),
        reason: format!("invalid JSON: {e}"),
    })
}
