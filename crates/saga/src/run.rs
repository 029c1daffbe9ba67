//! Folded view of a smoke-test run's journal.

use common::{CollaborationId, NotificationEvent, SecretId};
use serde::{Deserialize, Serialize};

use crate::events::SagaEvent;
use crate::state::{SagaState, SagaStep};

/// A smoke-test run rebuilt from its journal.
///
/// Tracks the state of the run, the steps that succeeded, the identifiers
/// accumulated along the way and the compensations that were executed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SagaRun {
    saga_type: String,
    state: SagaState,
    current_step: Option<SagaStep>,
    completed_steps: Vec<SagaStep>,
    collaboration_id: Option<CollaborationId>,
    /// Secret ID returned by the upload.
    secret_id: Option<SecretId>,
    /// Identifiers carried by the completion webhook.
    notification: NotificationEvent,
    receiver_running: bool,
    receiver_stops: u32,
    compensations_completed: Vec<String>,
    compensations_failed: Vec<String>,
    failed_step: Option<SagaStep>,
    failure_reason: Option<String>,
    journal: Vec<SagaEvent>,
}

impl SagaRun {
    /// Appends an event to the journal and applies it.
    pub fn record(&mut self, event: SagaEvent) {
        self.apply(event.clone());
        self.journal.push(event);
    }

    /// Rebuilds a run from a journal.
    pub fn replay(events: impl IntoIterator<Item = SagaEvent>) -> Self {
        let mut run = SagaRun::default();
        for event in events {
            run.record(event);
        }
        run
    }

    fn apply(&mut self, event: SagaEvent) {
        match event {
            SagaEvent::SagaStarted(data) => {
                self.saga_type = data.saga_type;
                self.state = SagaState::Running;
            }
            SagaEvent::StepStarted(data) => {
                self.current_step = Some(data.step);
                // A receiver whose start was attempted must be stopped,
                // even if it only partially started.
                if data.step == SagaStep::StartReceiver {
                    self.receiver_running = true;
                }
            }
            SagaEvent::StepCompleted(data) => {
                self.completed_steps.push(data.step);
                match data.step {
                    SagaStep::AwaitNotification => {
                        self.notification = NotificationEvent {
                            collaboration_id: data.collaboration_id,
                            secret_id: data.secret_id,
                        };
                    }
                    _ => {
                        if let Some(id) = data.collaboration_id {
                            self.collaboration_id = Some(id);
                        }
                        if let Some(id) = data.secret_id {
                            self.secret_id = Some(id);
                        }
                    }
                }
            }
            SagaEvent::StepFailed(data) => {
                self.failed_step = Some(data.step);
                self.failure_reason = Some(data.error);
            }
            SagaEvent::ReceiverStopped(_) => {
                self.receiver_running = false;
                self.receiver_stops += 1;
            }
            SagaEvent::CompensationStarted(_) => {
                self.state = SagaState::Compensating;
            }
            SagaEvent::CompensationStepCompleted(data) => {
                self.compensations_completed.push(data.compensation);
            }
            SagaEvent::CompensationStepFailed(data) => {
                self.compensations_failed.push(data.compensation);
            }
            SagaEvent::SagaCompleted(_) => {
                self.state = SagaState::Completed;
                self.current_step = None;
            }
            SagaEvent::SagaFailed(data) => {
                self.state = SagaState::Failed;
                self.current_step = None;
                self.failed_step = Some(data.step);
                self.failure_reason = Some(data.reason);
            }
        }
    }
}

// Query methods
impl SagaRun {
    pub fn state(&self) -> SagaState {
        self.state
    }

    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    /// Returns the step currently executing, if any.
    pub fn current_step(&self) -> Option<SagaStep> {
        self.current_step
    }

    pub fn completed_steps(&self) -> &[SagaStep] {
        &self.completed_steps
    }

    pub fn collaboration_id(&self) -> Option<&CollaborationId> {
        self.collaboration_id.as_ref()
    }

    pub fn secret_id(&self) -> Option<&SecretId> {
        self.secret_id.as_ref()
    }

    /// Returns the identifiers captured from the completion webhook.
    pub fn notification(&self) -> &NotificationEvent {
        &self.notification
    }

    /// Returns true while a receiver start has been attempted and not yet stopped.
    pub fn receiver_running(&self) -> bool {
        self.receiver_running
    }

    /// Number of times the receiver was stopped.
    pub fn receiver_stops(&self) -> u32 {
        self.receiver_stops
    }

    /// Names of compensations that succeeded, in execution order.
    pub fn compensations_completed(&self) -> &[String] {
        &self.compensations_completed
    }

    /// Names of compensations that failed, in execution order.
    pub fn compensations_failed(&self) -> &[String] {
        &self.compensations_failed
    }

    /// Every compensation that was attempted, in execution order.
    pub fn compensations_executed(&self) -> Vec<&str> {
        self.journal
            .iter()
            .filter_map(|event| match event {
                SagaEvent::CompensationStepCompleted(data) => Some(data.compensation.as_str()),
                SagaEvent::CompensationStepFailed(data) => Some(data.compensation.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn failed_step(&self) -> Option<SagaStep> {
        self.failed_step
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the journal in recording order.
    pub fn journal(&self) -> &[SagaEvent] {
        &self.journal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smoke_test::SAGA_TYPE;

    #[test]
    fn test_default_run() {
        let run = SagaRun::default();
        assert_eq!(run.state(), SagaState::NotStarted);
        assert!(run.completed_steps().is_empty());
        assert!(run.journal().is_empty());
    }

    #[test]
    fn test_step_lifecycle_accumulates_ids() {
        let mut run = SagaRun::default();
        run.record(SagaEvent::saga_started(SAGA_TYPE));
        assert_eq!(run.state(), SagaState::Running);
        assert_eq!(run.saga_type(), SAGA_TYPE);

        run.record(SagaEvent::step_started(SagaStep::CreateCollaboration));
        assert_eq!(run.current_step(), Some(SagaStep::CreateCollaboration));
        run.record(SagaEvent::step_completed(
            SagaStep::CreateCollaboration,
            Some(CollaborationId::new("3")),
            None,
        ));

        run.record(SagaEvent::step_started(SagaStep::UploadSecret));
        run.record(SagaEvent::step_completed(
            SagaStep::UploadSecret,
            None,
            Some(SecretId::new("input-secret")),
        ));

        run.record(SagaEvent::step_started(SagaStep::AwaitNotification));
        run.record(SagaEvent::step_completed(
            SagaStep::AwaitNotification,
            Some(CollaborationId::new("3")),
            Some(SecretId::new("result-secret")),
        ));

        assert_eq!(run.collaboration_id(), Some(&CollaborationId::new("3")));
        assert_eq!(run.secret_id(), Some(&SecretId::new("input-secret")));
        assert_eq!(
            run.notification().secret_id,
            Some(SecretId::new("result-secret"))
        );
        assert_eq!(
            run.completed_steps(),
            &[
                SagaStep::CreateCollaboration,
                SagaStep::UploadSecret,
                SagaStep::AwaitNotification
            ]
        );
    }

    #[test]
    fn test_receiver_tracking() {
        let mut run = SagaRun::default();
        run.record(SagaEvent::saga_started(SAGA_TYPE));
        run.record(SagaEvent::step_started(SagaStep::StartReceiver));
        assert!(run.receiver_running());

        run.record(SagaEvent::step_failed(SagaStep::StartReceiver, "address in use"));
        assert!(run.receiver_running());

        run.record(SagaEvent::receiver_stopped());
        assert!(!run.receiver_running());
        assert_eq!(run.receiver_stops(), 1);
    }

    #[test]
    fn test_compensation_and_failure() {
        let mut run = SagaRun::default();
        run.record(SagaEvent::saga_started(SAGA_TYPE));
        run.record(SagaEvent::step_started(SagaStep::RegisterInputParty));
        run.record(SagaEvent::step_failed(SagaStep::RegisterInputParty, "HTTP 500: boom"));
        run.record(SagaEvent::compensation_started(SagaStep::RegisterInputParty, 1));
        assert_eq!(run.state(), SagaState::Compensating);

        run.record(SagaEvent::compensation_step_failed("delete_collaboration", "HTTP 404"));
        run.record(SagaEvent::saga_failed(SagaStep::RegisterInputParty, "HTTP 500: boom"));

        assert_eq!(run.state(), SagaState::Failed);
        assert_eq!(run.failed_step(), Some(SagaStep::RegisterInputParty));
        assert_eq!(run.failure_reason(), Some("HTTP 500: boom"));
        assert_eq!(run.compensations_failed(), &["delete_collaboration".to_string()]);
        assert_eq!(run.compensations_executed(), vec!["delete_collaboration"]);
        assert!(run.current_step().is_none());
    }

    #[test]
    fn test_replay_matches_recorded_run() {
        let mut run = SagaRun::default();
        run.record(SagaEvent::saga_started(SAGA_TYPE));
        run.record(SagaEvent::step_started(SagaStep::CreateCollaboration));
        run.record(SagaEvent::step_completed(
            SagaStep::CreateCollaboration,
            Some(CollaborationId::new("9")),
            None,
        ));
        run.record(SagaEvent::compensation_started(SagaStep::FetchResult, 1));
        run.record(SagaEvent::compensation_step_completed("delete_collaboration"));
        run.record(SagaEvent::saga_completed());

        let replayed = SagaRun::replay(run.journal().to_vec());
        assert_eq!(replayed.state(), SagaState::Completed);
        assert_eq!(replayed.collaboration_id(), run.collaboration_id());
        assert_eq!(replayed.journal(), run.journal());
    }
}
