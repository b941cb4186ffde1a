//! Contribute command - run a fork-to-pull-request workflow

use crate::cli::progress::CliProgress;
use crate::cli::style::{Stylize, check, cross, hyperlink_url};
use anstream::{eprintln, println};
use anyhow::{Context, bail};
use clap::Args;
use gh_contrib::auth::{get_github_auth, test_github_auth};
use gh_contrib::remote::{GithubRemote, RemoteRepository};
use gh_contrib::types::{FileChange, RepoRef};
use gh_contrib::workflow::{ContributionRequest, ContributionResult, run_workflow};
use tokio_util::sync::CancellationToken;

/// Arguments for the contribute command
#[derive(Debug, Args)]
pub struct ContributeArgs {
    /// Upstream repository to contribute to (owner/name)
    pub upstream: String,

    /// Working branch name to create or reuse
    #[arg(short, long)]
    pub branch: String,

    /// Commit message (also the PR title unless --title is given)
    #[arg(short, long)]
    pub message: String,

    /// Add or update a file: REPO_PATH=LOCAL_FILE
    #[arg(long = "write", value_name = "REPO_PATH=LOCAL_FILE")]
    pub writes: Vec<String>,

    /// Delete a file at REPO_PATH
    #[arg(long = "delete", value_name = "REPO_PATH")]
    pub deletes: Vec<String>,

    /// Create an empty directory marker at REPO_PATH
    #[arg(long = "mkdir", value_name = "REPO_PATH")]
    pub mkdirs: Vec<String>,

    /// PR title (defaults to the commit message)
    #[arg(long)]
    pub title: Option<String>,

    /// PR body
    #[arg(long, default_value = "")]
    pub body: String,

    /// Base branch for the PR (defaults to the upstream default branch)
    #[arg(long)]
    pub base: Option<String>,

    /// Open the PR as a draft
    #[arg(long)]
    pub draft: bool,

    /// Skip the confirmation prompt before creating a fork
    #[arg(short, long)]
    pub yes: bool,

    /// GitHub Enterprise host (defaults to github.com)
    #[arg(long)]
    pub host: Option<String>,
}

/// Collect file changes from the CLI flags
async fn collect_changes(args: &ContributeArgs) -> anyhow::Result<Vec<FileChange>> {
    let mut changes = Vec::new();

    for write in &args.writes {
        let (repo_path, local_file) = write
            .split_once('=')
            .with_context(|| format!("--write {write:?}: expected REPO_PATH=LOCAL_FILE"))?;
        let content = tokio::fs::read_to_string(local_file)
            .await
            .with_context(|| format!("reading {local_file}"))?;
        changes.push(FileChange::write(repo_path, content));
    }
    for path in &args.deletes {
        changes.push(FileChange::delete(path.clone()));
    }
    for path in &args.mkdirs {
        changes.push(FileChange::directory(path.clone()));
    }

    Ok(changes)
}

/// Ask before creating a fork that doesn't exist yet
async fn confirm_fork(
    remote: &GithubRemote,
    upstream: &RepoRef,
    identity: &str,
) -> anyhow::Result<bool> {
    if remote.find_fork(upstream, identity).await?.is_some() {
        return Ok(true);
    }

    let prompt = format!("Fork {upstream} to {identity}/{}?", upstream.name);
    let confirmed = tokio::task::spawn_blocking(move || {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
    })
    .await??;
    Ok(confirmed)
}

fn print_summary(result: &ContributionResult) {
    println!();
    if let Some(fork) = &result.fork {
        println!("  fork:   {}", fork.repo.to_string().accent());
    }
    if let Some(branch) = &result.branch {
        println!("  branch: {}", branch.name.accent());
    }
    if let Some(sha) = &result.commit_sha {
        println!("  commit: {}", sha.accent());
    }
    if let Some(pr) = &result.pull_request {
        println!(
            "  pr:     {} ({})",
            format!("#{}", pr.number).accent(),
            hyperlink_url(&pr.html_url)
        );
    }
}

/// Run the contribute command
pub async fn run_contribute(args: ContributeArgs) -> anyhow::Result<()> {
    let upstream: RepoRef = args.upstream.parse()?;
    let changes = collect_changes(&args).await?;

    let auth = get_github_auth().await?;
    let identity = test_github_auth(&auth).await?;
    let remote = GithubRemote::new(&auth.token, args.host.as_deref())?;

    if upstream.owner != identity && !args.yes && !confirm_fork(&remote, &upstream, &identity).await?
    {
        println!("Aborted.");
        return Ok(());
    }

    let request = ContributionRequest {
        upstream: upstream.clone(),
        branch: args.branch.clone(),
        base_branch: args.base.clone(),
        changes,
        message: args.message.clone(),
        title: args.title.clone().unwrap_or_else(|| args.message.clone()),
        body: args.body.clone(),
        author: None,
        draft: args.draft,
        fork_poll: gh_contrib::fork::ForkPollPolicy::default(),
    };

    // Ctrl-C cancels between workflow steps instead of killing mid-request
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let progress = CliProgress::new();
    let result = run_workflow(&remote, &identity, &request, &progress, &cancel).await?;

    print_summary(&result);

    if let Some(failure) = &result.failure {
        println!();
        eprintln!(
            "{} Contribution failed at the {} step: {}",
            cross(),
            failure.step.to_string().emphasis(),
            failure.error.to_string().error()
        );
        if !result.steps_completed.is_empty() {
            eprintln!(
                "  Completed steps are left in place; re-running the same command will reuse them."
            );
        }
        bail!("contribution failed at the {} step", failure.step);
    }

    println!();
    println!(
        "{} Contribution to {} submitted",
        check(),
        upstream.to_string().emphasis()
    );
    Ok(())
}
