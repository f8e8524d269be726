mod engine;
mod intent;

use std::fmt;

pub use engine::{EngineError, ProposedChange, WorkflowEngine};
pub use intent::{ExternalStep, Intent, RegenScope};

/// Outcome of a single step in a multi-step commit.
///
/// Used by the workflow engine to report partial success/failure
/// so the CLI layer can render feedback appropriately.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Success(String),
    Skipped(String),
    Failed(String),
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(msg) => write!(f, "{}", msg),
            Self::Skipped(msg) => write!(f, "Skipped: {}", msg),
            Self::Failed(msg) => write!(f, "FAILED: {}", msg),
        }
    }
}

/// Everything one commit did, in execution order. External failures do not
/// unwind earlier steps, so the report is how the user learns what happened.
#[derive(Debug, Default)]
pub struct CommitReport {
    pub steps: Vec<(String, StepOutcome)>,
}

impl CommitReport {
    fn record(&mut self, step: impl Into<String>, outcome: StepOutcome) {
        self.steps.push((step.into(), outcome));
    }

    pub fn succeeded(&self) -> bool {
        !self.steps.iter().any(|(_, outcome)| outcome.is_failure())
    }
}
