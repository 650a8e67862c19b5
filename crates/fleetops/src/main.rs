mod cli;
mod commands;
mod config;
mod error;
mod notify;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleetops_core::{AuthCredentials, Fleet};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::notify::StderrNotifier;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

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

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a backend connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "fleetops", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let gateway_config = config::build_gateway_config(&cli.global)?;
            let notifier = StderrNotifier {
                quiet: cli.global.quiet,
                color: output::should_color(&cli.global.color, &std::io::stderr()),
            };
            let fleet = Fleet::connect(&gateway_config)
                .await?
                .with_notifier(Arc::new(notifier));

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &fleet, &cli.global).await;
            // Tokens minted for this run are revoked; stored ones are kept.
            if matches!(gateway_config.auth, AuthCredentials::Password { .. }) {
                fleet.sign_out().await;
            }
            result
        }
    }
}
