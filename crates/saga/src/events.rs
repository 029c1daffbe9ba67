//! Saga journal events.

use chrono::{DateTime, Utc};
use common::{CollaborationId, SecretId};
use serde::{Deserialize, Serialize};

use crate::state::SagaStep;

/// Events recorded while a smoke-test run executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// Run started.
    SagaStarted(SagaStartedData),

    /// A forward step started execution.
    StepStarted(StepData),

    /// A forward step completed successfully.
    StepCompleted(StepCompletedData),

    /// A forward step failed.
    StepFailed(StepFailedData),

    /// The webhook receiver was stopped.
    ReceiverStopped(ReceiverStoppedData),

    /// The compensation stack started draining.
    CompensationStarted(CompensationData),

    /// A compensation completed successfully.
    CompensationStepCompleted(CompensationStepData),

    /// A compensation failed (logged, draining continues).
    CompensationStepFailed(CompensationFailedData),

    /// Run completed successfully.
    SagaCompleted(SagaCompletedData),

    /// Run failed after compensation.
    SagaFailed(SagaFailedData),
}

impl SagaEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::SagaStarted(_) => "SagaStarted",
            SagaEvent::StepStarted(_) => "StepStarted",
            SagaEvent::StepCompleted(_) => "StepCompleted",
            SagaEvent::StepFailed(_) => "StepFailed",
            SagaEvent::ReceiverStopped(_) => "ReceiverStopped",
            SagaEvent::CompensationStarted(_) => "CompensationStarted",
            SagaEvent::CompensationStepCompleted(_) => "CompensationStepCompleted",
            SagaEvent::CompensationStepFailed(_) => "CompensationStepFailed",
            SagaEvent::SagaCompleted(_) => "SagaCompleted",
            SagaEvent::SagaFailed(_) => "SagaFailed",
        }
    }
}

/// Data for SagaStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaStartedData {
    /// The type of saga (e.g., "PlatformSmokeTest").
    pub saga_type: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

/// Data for StepStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepData {
    pub step: SagaStep,
}

/// Data for StepCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCompletedData {
    pub step: SagaStep,
    /// Set by create_collaboration, and by await_notification with the
    /// id carried in the webhook.
    pub collaboration_id: Option<CollaborationId>,
    /// Set by upload_secret, and by await_notification with the result
    /// secret carried in the webhook.
    pub secret_id: Option<SecretId>,
}

/// Data for StepFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailedData {
    pub step: SagaStep,
    /// Error message describing the failure.
    pub error: String,
}

/// Data for ReceiverStopped event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverStoppedData {
    pub stopped_at: DateTime<Utc>,
}

/// Data for CompensationStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationData {
    /// The step whose outcome triggered cleanup.
    pub trigger: SagaStep,
    /// Number of compensations on the stack.
    pub pending: usize,
}

/// Data for CompensationStepCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationStepData {
    pub compensation: String,
}

/// Data for CompensationStepFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationFailedData {
    pub compensation: String,
    pub error: String,
}

/// Data for SagaCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaCompletedData {
    pub completed_at: DateTime<Utc>,
}

/// Data for SagaFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaFailedData {
    pub step: SagaStep,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

// Convenience constructors
impl SagaEvent {
    /// Creates a SagaStarted event.
    pub fn saga_started(saga_type: impl Into<String>) -> Self {
        SagaEvent::SagaStarted(SagaStartedData {
            saga_type: saga_type.into(),
            started_at: Utc::now(),
        })
    }

    /// Creates a StepStarted event.
    pub fn step_started(step: SagaStep) -> Self {
        SagaEvent::StepStarted(StepData { step })
    }

    /// Creates a StepCompleted event.
    pub fn step_completed(
        step: SagaStep,
        collaboration_id: Option<CollaborationId>,
        secret_id: Option<SecretId>,
    ) -> Self {
        SagaEvent::StepCompleted(StepCompletedData {
            step,
            collaboration_id,
            secret_id,
        })
    }

    /// Creates a StepFailed event.
    pub fn step_failed(step: SagaStep, error: impl Into<String>) -> Self {
        SagaEvent::StepFailed(StepFailedData {
            step,
            error: error.into(),
        })
    }

    /// Creates a ReceiverStopped event.
    pub fn receiver_stopped() -> Self {
        SagaEvent::ReceiverStopped(ReceiverStoppedData {
            stopped_at: Utc::now(),
        })
    }

    /// Creates a CompensationStarted event.
    pub fn compensation_started(trigger: SagaStep, pending: usize) -> Self {
        SagaEvent::CompensationStarted(CompensationData { trigger, pending })
    }

    /// Creates a CompensationStepCompleted event.
    pub fn compensation_step_completed(compensation: impl Into<String>) -> Self {
        SagaEvent::CompensationStepCompleted(CompensationStepData {
            compensation: compensation.into(),
        })
    }

    /// Creates a CompensationStepFailed event.
    pub fn compensation_step_failed(
        compensation: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        SagaEvent::CompensationStepFailed(CompensationFailedData {
            compensation: compensation.into(),
            error: error.into(),
        })
    }

    /// Creates a SagaCompleted event.
    pub fn saga_completed() -> Self {
        SagaEvent::SagaCompleted(SagaCompletedData {
            completed_at: Utc::now(),
        })
    }

    /// Creates a SagaFailed event.
    pub fn saga_failed(step: SagaStep, reason: impl Into<String>) -> Self {
        SagaEvent::SagaFailed(SagaFailedData {
            step,
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }
}
