//! gh-contrib - contribute changes upstream as fork + branch + commit + PR
//!
//! CLI binary driving the contribution workflow orchestrator.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "gh-contrib")]
#[command(about = "Idempotent fork-to-pull-request contributions for GitHub")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Contribute a set of file changes upstream as a single commit + PR
    Contribute(cli::ContributeArgs),

    /// Authentication management
    Auth {
        #[command(subcommand)]
        action: cli::AuthAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Contribute(args) => {
            cli::run_contribute(args).await?;
        }
        Commands::Auth { action } => {
            cli::run_auth(action).await?;
        }
    }

    Ok(())
}
