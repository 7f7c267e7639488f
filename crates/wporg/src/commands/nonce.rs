//! `wporg nonce`: log in and print a fresh REST nonce.

use serde::Serialize;
use wporg_api::{CancellationToken, WordPressOrgRestApi};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct NonceInfo {
    nonce: String,
    api_root: String,
}

pub async fn handle(
    client: &WordPressOrgRestApi,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let nonce = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(CliError::Cancelled),
        nonce = client.refresh_nonce() => nonce?,
    };

    let info = NonceInfo {
        nonce: nonce.to_string(),
        api_root: client.api_root().to_string(),
    };
    let out = output::render_single(
        global.output,
        &info,
        |i| format!("nonce:    {}\napi_root: {}", i.nonce, i.api_root),
        |i| i.nonce.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
