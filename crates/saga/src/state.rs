//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a smoke-test run in its lifecycle.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──► Compensating ──┬──► Completed
///                                           └──► Failed
/// ```
///
/// A successful run also passes through `Compensating`: the remote state
/// it created is always torn down before the verdict is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Saga has not started yet.
    #[default]
    NotStarted,

    /// Forward steps are being executed.
    Running,

    /// The compensation stack is being drained.
    Compensating,

    /// All forward steps succeeded and cleanup ran (terminal state).
    Completed,

    /// A forward step failed and cleanup ran (terminal state).
    Failed,
}

impl SagaState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "NotStarted",
            SagaState::Running => "Running",
            SagaState::Compensating => "Compensating",
            SagaState::Completed => "Completed",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Forward steps of the smoke test, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    CreateCollaboration,
    RegisterInputParty,
    StartReceiver,
    RegisterOutputParty,
    UploadSecret,
    AwaitNotification,
    FetchResult,
}

impl SagaStep {
    /// All steps in forward order.
    pub const ALL: [SagaStep; 7] = [
        SagaStep::CreateCollaboration,
        SagaStep::RegisterInputParty,
        SagaStep::StartReceiver,
        SagaStep::RegisterOutputParty,
        SagaStep::UploadSecret,
        SagaStep::AwaitNotification,
        SagaStep::FetchResult,
    ];

    /// Returns the step name used in logs and the journal.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStep::CreateCollaboration => "create_collaboration",
            SagaStep::RegisterInputParty => "register_input_party",
            SagaStep::StartReceiver => "start_receiver",
            SagaStep::RegisterOutputParty => "register_output_party",
            SagaStep::UploadSecret => "upload_secret",
            SagaStep::AwaitNotification => "await_notification",
            SagaStep::FetchResult => "fetch_result",
        }
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
