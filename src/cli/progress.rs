//! CLI progress callback with styled output and a fork-poll spinner

use crate::cli::style::{Stylize, check, hyperlink_url, spinner_style};
use anstream::println;
use async_trait::async_trait;
use gh_contrib::types::{PullRequest, RepoRef};
use gh_contrib::workflow::{WorkflowProgress, WorkflowStep};
use indicatif::ProgressBar;
use std::sync::Mutex;
use std::time::Duration;

/// Prints workflow progress to the terminal.
///
/// Fork readiness polling can take a while, so it gets a spinner; the other
/// steps print a line when reached.
pub struct CliProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Create a CLI progress printer
    pub const fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn clear_spinner(&self) {
        if let Some(spinner) = self.spinner.lock().unwrap().take() {
            spinner.finish_and_clear();
        }
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowProgress for CliProgress {
    async fn on_step_started(&self, step: WorkflowStep) {
        let action = match step {
            WorkflowStep::ForkEnsured => "Resolving fork",
            WorkflowStep::BranchEnsured => "Resolving branch",
            WorkflowStep::Committed => "Committing changes",
            WorkflowStep::PrComposed => "Composing pull request",
        };
        println!("{}...", action.emphasis());
    }

    async fn on_step_completed(&self, step: WorkflowStep) {
        self.clear_spinner();
        println!("  {} {}", check(), format!("{step} ready").muted());
    }

    async fn on_fork_poll(&self, fork: &RepoRef, attempt: u32) {
        let mut guard = self.spinner.lock().unwrap();
        let spinner = guard.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner().with_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        spinner.set_message(format!("Waiting for {fork} (attempt {attempt})"));
    }

    async fn on_pull_request(&self, pr: &PullRequest) {
        let pr_num = format!("#{}", pr.number);
        println!("  {} Pull request {}", check(), pr_num.accent());
        println!("    {}", hyperlink_url(&pr.html_url));
    }

    async fn on_message(&self, message: &str) {
        println!("{message}");
    }
}
