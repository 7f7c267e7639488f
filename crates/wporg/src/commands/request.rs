//! Raw REST verbs: get / post / put / delete.

use serde_json::Value;
use wporg_api::{ApiRequest, CancellationToken, WordPressOrgRestApi};

use crate::cli::{BodyArgs, GlobalOpts, RequestArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

/// Apply query pairs and headers from the command line.
fn build(request: ApiRequest, args: RequestArgs) -> ApiRequest {
    let request = args
        .query
        .into_iter()
        .fold(request, |req, (k, v)| req.query(k, v));
    args.headers
        .into_iter()
        .fold(request, |req, (k, v)| req.header(k, v))
}

/// Attach a `--json` or `--form` body, if any.
fn with_body(
    request: ApiRequest,
    json: Option<&str>,
    form: Vec<(String, String)>,
) -> Result<ApiRequest, CliError> {
    if let Some(json) = json {
        return Ok(request.json_value(util::read_json_arg(json)?));
    }
    if form.is_empty() {
        Ok(request)
    } else {
        Ok(request.form(form))
    }
}

async fn run(
    client: &WordPressOrgRestApi,
    request: &ApiRequest,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    tracing::debug!(method = %request.method(), path = request.path(), "sending request");
    let body: Value = client.request_cancellable(request, cancel).await?;
    output::print_output(&output::render_value(global.output, &body), global.quiet);
    Ok(())
}

pub async fn get(
    client: &WordPressOrgRestApi,
    args: RequestArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let request = build(ApiRequest::get(args.path.clone()), args);
    run(client, &request, global, cancel).await
}

pub async fn delete(
    client: &WordPressOrgRestApi,
    args: RequestArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let request = build(ApiRequest::delete(args.path.clone()), args);
    run(client, &request, global, cancel).await
}

pub async fn post(
    client: &WordPressOrgRestApi,
    args: BodyArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let request = build(ApiRequest::post(args.request.path.clone()), args.request);
    let request = with_body(request, args.json.as_deref(), args.form)?;
    run(client, &request, global, cancel).await
}

pub async fn put(
    client: &WordPressOrgRestApi,
    args: BodyArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let request = build(ApiRequest::put(args.request.path.clone()), args.request);
    let request = with_body(request, args.json.as_deref(), args.form)?;
    run(client, &request, global, cancel).await
}
