//! Auth command - test and manage GitHub authentication

use clap::Subcommand;
use gh_contrib::auth::{get_github_auth, test_github_auth};
use gh_contrib::error::Result;

/// Auth subcommands
#[derive(Debug, Subcommand)]
pub enum AuthAction {
    /// Test authentication
    Test,
    /// Show authentication setup instructions
    Setup,
}

/// Run the auth test command
pub async fn run_auth_test() -> Result<()> {
    println!("Testing GitHub authentication...");
    let config = get_github_auth().await?;
    let username = test_github_auth(&config).await?;
    println!("Authenticated as: {username}");
    println!("Token source: {:?}", config.source);
    Ok(())
}

/// Run the auth setup command (show instructions)
pub fn run_auth_setup() {
    println!("GitHub Authentication Setup");
    println!("===========================");
    println!();
    println!("Option 1: GitHub CLI (recommended)");
    println!("  Install: https://cli.github.com/");
    println!("  Run: gh auth login");
    println!();
    println!("Option 2: Environment variable");
    println!("  Set GITHUB_TOKEN or GH_TOKEN");
    println!();
    println!("For GitHub Enterprise:");
    println!("  Pass --host to point at your instance");
}

/// Dispatch an auth subcommand
pub async fn run_auth(action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Test => run_auth_test().await,
        AuthAction::Setup => {
            run_auth_setup();
            Ok(())
        }
    }
}
