//! Terminal outcome of a smoke-test run.

use crate::error::SagaError;
use crate::run::SagaRun;
use crate::state::SagaStep;

/// Process exit code for a passing run.
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code for a failing run.
pub const EXIT_FAILURE: i32 = 1;

/// Pass/fail result of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Every step succeeded; carries the fetched result payload.
    Success(serde_json::Value),
    /// A step failed; cleanup has already run.
    Failure { step: SagaStep, cause: SagaError },
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success(_))
    }

    /// Returns the exit code the process should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Success(_) => EXIT_SUCCESS,
            Verdict::Failure { .. } => EXIT_FAILURE,
        }
    }

    /// Returns the failing step, if any.
    pub fn failed_step(&self) -> Option<SagaStep> {
        match self {
            Verdict::Success(_) => None,
            Verdict::Failure { step, .. } => Some(*step),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Success(_) => write!(f, "smoke test passed"),
            Verdict::Failure { step, cause } => {
                write!(f, "smoke test failed at step '{step}': {cause}")
            }
        }
    }
}

/// Verdict together with the journal of the run that produced it.
#[derive(Debug, Clone)]
pub struct SagaOutcome {
    pub verdict: Verdict,
    pub run: SagaRun,
}

impl SagaOutcome {
    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }
}
