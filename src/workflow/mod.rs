//! Contribution workflow orchestrator
//!
//! Sequences fork resolution, branch resolution, the batch commit, and PR
//! composition into one logical operation with a precise failure point:
//! `START -> FORK_ENSURED -> BRANCH_ENSURED -> COMMITTED -> PR_COMPOSED -> DONE`.

mod progress;
mod run;

pub use progress::{NoopProgress, WorkflowProgress};
pub use run::{ContributionRequest, ContributionResult, WorkflowStep, run_workflow};
