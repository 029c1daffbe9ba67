//! Integration tests for the smoke-test saga against in-memory services.

use std::time::Duration;

use common::{CollaborationId, NotificationEvent, PartyIndex, SecretId};
use saga::{
    CollaborationSpec, InMemoryCoordinationService, InMemoryReceiver, InMemorySecretService,
    NotificationPolicy, SagaError, SagaEvent, SagaState, SagaStep, SecretUpload,
    SmokeTestCoordinator, SmokeTestPlan, Verdict,
};

type TestCoordinator =
    SmokeTestCoordinator<InMemoryCoordinationService, InMemorySecretService, InMemoryReceiver>;

struct TestHarness {
    coordinator: TestCoordinator,
    coordination: InMemoryCoordinationService,
    secrets: InMemorySecretService,
    receiver: InMemoryReceiver,
}

impl TestHarness {
    fn new() -> Self {
        let coordination = InMemoryCoordinationService::new();
        let secrets = InMemorySecretService::new();
        let receiver = InMemoryReceiver::new();

        let coordinator =
            SmokeTestCoordinator::new(coordination.clone(), secrets.clone(), receiver.clone());

        Self {
            coordinator,
            coordination,
            secrets,
            receiver,
        }
    }

    fn plan(&self) -> SmokeTestPlan {
        SmokeTestPlan {
            collaboration: CollaborationSpec::new(b"print_ln('%s', 1)".to_vec(), b"{}".to_vec()),
            secret: SecretUpload::new("data\n42\n"),
            party: PartyIndex::new(1),
            callback_url: "http://tester.local:8080".to_string(),
            notification: NotificationPolicy::new(Duration::from_millis(5), 6),
        }
    }

    /// Stages a notification and result for the collaboration the next run creates.
    fn stage_completion(&self, collaboration: &str) {
        let id = CollaborationId::new(collaboration);
        self.receiver.deliver(NotificationEvent::new(
            id.clone(),
            SecretId::new("result-secret"),
        ));
        self.secrets
            .set_result(id, PartyIndex::new(1), serde_json::json!({"result": [42]}));
    }
}

#[tokio::test]
async fn test_full_run_succeeds_and_cleans_up() {
    let h = TestHarness::new();
    h.stage_completion("1");

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert_eq!(
        outcome.verdict,
        Verdict::Success(serde_json::json!({"result": [42]}))
    );
    assert_eq!(outcome.exit_code(), 0);

    let run = &outcome.run;
    assert_eq!(run.state(), SagaState::Completed);
    assert_eq!(run.completed_steps(), &SagaStep::ALL);
    assert_eq!(run.collaboration_id(), Some(&CollaborationId::new("1")));
    assert_eq!(run.secret_id(), Some(&SecretId::new("SECRET-0001")));
    assert_eq!(
        run.notification().secret_id,
        Some(SecretId::new("result-secret"))
    );

    // Cleanup is unconditional after a completed run
    assert_eq!(
        run.compensations_executed(),
        vec![
            "discard_secret",
            "deregister_output_party",
            "deregister_input_party",
            "delete_collaboration"
        ]
    );
    assert!(run.compensations_failed().is_empty());
    assert_eq!(h.coordination.collaboration_count(), 0);

    // Receiver stopped exactly once
    assert_eq!(h.receiver.start_count(), 1);
    assert_eq!(h.receiver.stop_count(), 1);
    assert_eq!(run.receiver_stops(), 1);
}

#[tokio::test]
async fn test_remote_calls_on_timeout_are_unwound_in_reverse() {
    let h = TestHarness::new();

    // No notification staged: the run times out after registering.
    let outcome = h.coordinator.execute(&h.plan()).await;
    assert_eq!(outcome.verdict.failed_step(), Some(SagaStep::AwaitNotification));

    let calls = h.coordination.calls();
    assert_eq!(
        calls,
        vec![
            "create_collaboration",
            "register_input_party 1",
            "register_output_party 1",
            "deregister_input_party 1",
            "delete_collaboration 1",
        ]
    );
}

#[tokio::test]
async fn test_create_failure_runs_no_compensation() {
    let h = TestHarness::new();
    h.coordination.set_fail_on_create(true);

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert_eq!(outcome.exit_code(), 1);
    assert!(matches!(
        outcome.verdict,
        Verdict::Failure {
            step: SagaStep::CreateCollaboration,
            cause: SagaError::Transport(_),
        }
    ));
    assert_eq!(outcome.run.state(), SagaState::Failed);
    assert!(outcome.run.compensations_executed().is_empty());
    assert_eq!(h.receiver.start_count(), 0);
    assert_eq!(h.receiver.stop_count(), 0);
}

#[tokio::test]
async fn test_register_input_failure_deletes_collaboration() {
    let h = TestHarness::new();
    h.coordination.set_fail_on_register_input(true);

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert_eq!(
        outcome.verdict.failed_step(),
        Some(SagaStep::RegisterInputParty)
    );
    assert_eq!(
        outcome.run.compensations_executed(),
        vec!["delete_collaboration"]
    );
    assert_eq!(outcome.run.completed_steps(), &[SagaStep::CreateCollaboration]);
    assert_eq!(h.coordination.collaboration_count(), 0);
    assert_eq!(h.receiver.start_count(), 0);
}

#[tokio::test]
async fn test_receiver_start_failure_stops_receiver_and_compensates() {
    let h = TestHarness::new();
    h.receiver.set_fail_on_start(true);

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert!(matches!(
        outcome.verdict,
        Verdict::Failure {
            step: SagaStep::StartReceiver,
            cause: SagaError::LocalResource(_),
        }
    ));
    assert_eq!(
        outcome.run.compensations_executed(),
        vec!["deregister_input_party", "delete_collaboration"]
    );
    assert_eq!(h.receiver.stop_count(), 1);
    assert_eq!(h.coordination.collaboration_count(), 0);
}

#[tokio::test]
async fn test_register_output_failure_compensates_first_two_steps() {
    let h = TestHarness::new();
    h.coordination.set_fail_on_register_output(true);

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert_eq!(outcome.exit_code(), 1);
    match &outcome.verdict {
        Verdict::Failure {
            step: SagaStep::RegisterOutputParty,
            cause: SagaError::Transport(err),
        } => assert_eq!(err.status(), Some(500)),
        other => panic!("unexpected verdict: {other:?}"),
    }
    assert_eq!(
        outcome.run.compensations_executed(),
        vec!["deregister_input_party", "delete_collaboration"]
    );
    assert_eq!(h.receiver.start_count(), 1);
    assert_eq!(h.receiver.stop_count(), 1);
    assert_eq!(h.coordination.collaboration_count(), 0);
}

#[tokio::test]
async fn test_upload_failure_compensates_three_steps() {
    let h = TestHarness::new();
    h.secrets.set_fail_on_upload(true);

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert_eq!(outcome.verdict.failed_step(), Some(SagaStep::UploadSecret));
    assert_eq!(
        outcome.run.compensations_executed(),
        vec![
            "deregister_output_party",
            "deregister_input_party",
            "delete_collaboration"
        ]
    );
    assert_eq!(h.receiver.stop_count(), 1);
}

#[tokio::test]
async fn test_missing_notification_times_out() {
    let h = TestHarness::new();

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert!(matches!(
        outcome.verdict,
        Verdict::Failure {
            step: SagaStep::AwaitNotification,
            cause: SagaError::Timeout { attempts: 6, .. },
        }
    ));
    assert_eq!(h.receiver.poll_count(), 6);
    assert_eq!(h.receiver.stop_count(), 1);
    assert_eq!(outcome.run.compensations_executed().len(), 4);
    assert_eq!(h.coordination.collaboration_count(), 0);
}

#[tokio::test]
async fn test_partial_notification_is_never_ready() {
    let h = TestHarness::new();
    h.receiver.deliver(NotificationEvent {
        collaboration_id: Some(CollaborationId::new("1")),
        secret_id: None,
    });

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert_eq!(
        outcome.verdict.failed_step(),
        Some(SagaStep::AwaitNotification)
    );
    assert!(!outcome.run.notification().is_ready());
}

#[tokio::test]
async fn test_fetch_failure_still_cleans_up() {
    let h = TestHarness::new();
    h.stage_completion("1");
    h.secrets.set_fail_on_fetch(true);

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert_eq!(outcome.verdict.failed_step(), Some(SagaStep::FetchResult));
    assert_eq!(outcome.run.compensations_executed().len(), 4);
    assert_eq!(h.receiver.stop_count(), 1);
    assert_eq!(h.coordination.collaboration_count(), 0);
}

#[tokio::test]
async fn test_failing_compensation_does_not_abort_cleanup() {
    let h = TestHarness::new();
    h.coordination.set_fail_on_deregister_input(true);
    h.secrets.set_fail_on_upload(true);

    let outcome = h.coordinator.execute(&h.plan()).await;

    assert_eq!(
        outcome.run.compensations_failed(),
        &["deregister_input_party".to_string()]
    );
    assert_eq!(
        outcome.run.compensations_completed(),
        &[
            "deregister_output_party".to_string(),
            "delete_collaboration".to_string()
        ]
    );
    assert_eq!(h.coordination.collaboration_count(), 0);
}

#[tokio::test]
async fn test_compensation_count_matches_successful_steps() {
    let cases = [
        (SagaStep::CreateCollaboration, 0),
        (SagaStep::RegisterInputParty, 1),
        (SagaStep::StartReceiver, 2),
        (SagaStep::RegisterOutputParty, 2),
        (SagaStep::UploadSecret, 3),
    ];

    for (failing, expected) in cases {
        let h = TestHarness::new();
        match failing {
            SagaStep::CreateCollaboration => h.coordination.set_fail_on_create(true),
            SagaStep::RegisterInputParty => h.coordination.set_fail_on_register_input(true),
            SagaStep::StartReceiver => h.receiver.set_fail_on_start(true),
            SagaStep::RegisterOutputParty => h.coordination.set_fail_on_register_output(true),
            SagaStep::UploadSecret => h.secrets.set_fail_on_upload(true),
            _ => unreachable!(),
        }

        let outcome = h.coordinator.execute(&h.plan()).await;
        assert_eq!(outcome.verdict.failed_step(), Some(failing));
        assert_eq!(
            outcome.run.compensations_executed().len(),
            expected,
            "failing step {failing}"
        );
    }
}

#[tokio::test]
async fn test_journal_orders_cleanup_after_receiver_stop() {
    let h = TestHarness::new();
    h.secrets.set_fail_on_upload(true);

    let outcome = h.coordinator.execute(&h.plan()).await;
    let types: Vec<&str> = outcome
        .run
        .journal()
        .iter()
        .map(SagaEvent::event_type)
        .collect();

    let stopped = types.iter().position(|t| *t == "ReceiverStopped").unwrap();
    let compensating = types
        .iter()
        .position(|t| *t == "CompensationStarted")
        .unwrap();
    assert!(stopped < compensating);
    assert_eq!(types.last(), Some(&"SagaFailed"));
}

#[tokio::test]
async fn test_consecutive_runs_are_independent() {
    let h = TestHarness::new();
    h.stage_completion("1");
    let first = h.coordinator.execute(&h.plan()).await;

    h.stage_completion("2");
    let second = h.coordinator.execute(&h.plan()).await;

    assert!(first.verdict.is_success());
    assert!(second.verdict.is_success());
    assert_eq!(first.run.collaboration_id(), Some(&CollaborationId::new("1")));
    assert_eq!(second.run.collaboration_id(), Some(&CollaborationId::new("2")));
    assert_eq!(h.receiver.start_count(), 2);
    assert_eq!(h.receiver.stop_count(), 2);
    assert_eq!(h.coordination.collaboration_count(), 0);
}
