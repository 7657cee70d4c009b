//! scenedeploy: build, sign and publish scenes from the command line.

mod config;
mod deploy;
mod prompt;
mod tracking;

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "scenedeploy", version, about = "Build, sign and publish scenes")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the project, sign its entity and upload it
    Deploy(deploy::DeployArgs),
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn,scenedeploy=info",
        1 => "info,scenedeploy=debug",
        _ => "debug,scenedeploy=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Deploy(args) => deploy::run(args).await,
    };

    match result {
        Ok(outcome) if outcome.success => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use scenedeploy_protocol::Network;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_deploy_flags() {
        let cli = Cli::try_parse_from([
            "scenedeploy",
            "deploy",
            "--target",
            "peer.example.org",
            "--network",
            "sepolia",
            "--skip-build",
            "-y",
        ])
        .unwrap();
        let Commands::Deploy(args) = cli.command;
        assert_eq!(args.target.as_deref(), Some("peer.example.org"));
        assert_eq!(args.network, Network::Sepolia);
        assert!(args.skip_build);
        assert!(args.yes);
        assert!(!args.force_upload);
    }

    #[test]
    fn targets_conflict() {
        let err = Cli::try_parse_from([
            "scenedeploy",
            "deploy",
            "--target",
            "a.example.org",
            "--target-content",
            "b.example.org/content",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
