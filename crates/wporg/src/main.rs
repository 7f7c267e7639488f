mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wporg_api::CancellationToken;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Token cancelled on Ctrl-C, so in-flight calls stop without caching
/// a half-retrieved nonce.
fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupted, cancelling in-flight request");
            trigger.cancel();
        }
    });
    cancel
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a site connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "wporg", &mut std::io::stdout());
            Ok(())
        }

        // Discovery needs a URL but no credentials
        Command::Discover(args) => {
            commands::discover::handle(args, &cli.global, &interrupt_token()).await
        }

        // All other commands require an authenticated client
        cmd => {
            let cancel = interrupt_token();
            let site = config::build_site_config(&cli.global)?;
            let client = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(CliError::Cancelled),
                client = site.connect() => client?,
            };

            tracing::debug!(command = ?cmd, api_root = %client.api_root(), "dispatching command");
            commands::dispatch(cmd, &client, &cli.global, &cancel).await
        }
    }
}
