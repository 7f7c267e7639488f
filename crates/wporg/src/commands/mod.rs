//! Command dispatch: bridges CLI args -> REST client calls -> output formatting.

pub mod config_cmd;
pub mod discover;
pub mod nonce;
pub mod request;
pub mod util;

use wporg_api::{CancellationToken, WordPressOrgRestApi};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a site-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &WordPressOrgRestApi,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    match cmd {
        Command::Get(args) => request::get(client, args, global, cancel).await,
        Command::Delete(args) => request::delete(client, args, global, cancel).await,
        Command::Post(args) => request::post(client, args, global, cancel).await,
        Command::Put(args) => request::put(client, args, global, cancel).await,
        Command::Nonce => nonce::handle(client, global, cancel).await,
        // Discover, Config and Completions are handled before dispatch
        Command::Discover(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
