//! `wporg discover <site>`: find a site's REST API root. Needs no credentials.

use std::time::Duration;

use serde::Serialize;
use url::Url;
use wporg_api::{CancellationToken, TlsMode, TransportConfig, discover_api_root};

use crate::cli::{DiscoverArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Discovery {
    site: String,
    api_root: String,
}

pub async fn handle(
    args: DiscoverArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let site: Url = args.site.parse().map_err(|_| CliError::Validation {
        field: "site".into(),
        reason: format!("invalid URL: {}", args.site),
    })?;

    let mut transport = TransportConfig::default();
    if global.insecure {
        transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(timeout) = global.timeout {
        transport.timeout = Duration::from_secs(timeout);
    }
    let http = transport.build_client()?;

    let api_root = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(CliError::Cancelled),
        root = discover_api_root(&http, &site) => root?,
    };

    let found = Discovery {
        site: site.to_string(),
        api_root: api_root.to_string(),
    };
    let out = output::render_single(
        global.output,
        &found,
        |d| format!("site:     {}\napi_root: {}", d.site, d.api_root),
        |d| d.api_root.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
