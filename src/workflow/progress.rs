//! Progress callback trait for interface-agnostic updates
//!
//! Lets different surfaces (CLI, a tool server, tests) observe a running
//! workflow without coupling the orchestrator to any output format.

use crate::types::{PullRequest, RepoRef};
use crate::workflow::WorkflowStep;
use async_trait::async_trait;

/// Progress callback trait
///
/// Implement this trait to receive updates while a contribution workflow
/// runs. CLI implementations can print to the terminal; a tool server can
/// forward structured events to its caller.
#[async_trait]
pub trait WorkflowProgress: Send + Sync {
    /// Called when the orchestrator starts working toward a step
    async fn on_step_started(&self, step: WorkflowStep);

    /// Called when a step has been reached
    async fn on_step_completed(&self, step: WorkflowStep);

    /// Called before each fork readiness check
    async fn on_fork_poll(&self, fork: &RepoRef, attempt: u32);

    /// Called when the workflow's pull request is known (created or reused)
    async fn on_pull_request(&self, pr: &PullRequest);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for tests or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl WorkflowProgress for NoopProgress {
    async fn on_step_started(&self, _step: WorkflowStep) {}
    async fn on_step_completed(&self, _step: WorkflowStep) {}
    async fn on_fork_poll(&self, _fork: &RepoRef, _attempt: u32) {}
    async fn on_pull_request(&self, _pr: &PullRequest) {}
    async fn on_message(&self, _message: &str) {}
}
