//! Saga coordinator for the platform smoke test.

use std::future::Future;
use std::time::Instant;

use common::NotificationEvent;

use crate::compensation::{Compensation, CompensationStack};
use crate::error::{SagaError, ServiceError};
use crate::events::SagaEvent;
use crate::run::SagaRun;
use crate::services::{CoordinationService, NotificationReceiver, SecretService};
use crate::smoke_test::{NotificationPolicy, SAGA_TYPE, SmokeTestPlan};
use crate::state::SagaStep;
use crate::verdict::{SagaOutcome, Verdict};

/// A forward step that ended the run.
struct StepFailure {
    step: SagaStep,
    cause: SagaError,
}

/// Drives one collaboration through its full lifecycle.
///
/// Steps run strictly in order. Every step that creates remote state
/// pushes exactly one compensation; on any failure the receiver is stopped
/// and the stack is drained in reverse. After a completed run the stack is
/// drained as well, so no collaboration outlives the process.
pub struct SmokeTestCoordinator<C, S, R>
where
    C: CoordinationService,
    S: SecretService,
    R: NotificationReceiver,
{
    coordination: C,
    secrets: S,
    receiver: R,
}

impl<C, S, R> SmokeTestCoordinator<C, S, R>
where
    C: CoordinationService,
    S: SecretService,
    R: NotificationReceiver,
{
    /// Creates a new coordinator.
    pub fn new(coordination: C, secrets: S, receiver: R) -> Self {
        Self {
            coordination,
            secrets,
            receiver,
        }
    }

    /// Executes one smoke-test run.
    ///
    /// Never returns an error: every failure is folded into the verdict
    /// after cleanup has run.
    #[tracing::instrument(skip_all, fields(saga_type = SAGA_TYPE, party = %plan.party))]
    pub async fn execute(&self, plan: &SmokeTestPlan) -> SagaOutcome {
        metrics::counter!("smoketest_runs_total").increment(1);
        let started = Instant::now();

        let mut run = SagaRun::default();
        let mut stack = CompensationStack::new();
        run.record(SagaEvent::saga_started(SAGA_TYPE));

        let verdict = match self.forward(plan, &mut run, &mut stack).await {
            Ok(result) => {
                self.compensate(&mut run, &mut stack, SagaStep::FetchResult)
                    .await;
                run.record(SagaEvent::saga_completed());
                metrics::counter!("smoketest_succeeded").increment(1);
                tracing::info!(
                    duration = started.elapsed().as_secs_f64(),
                    "smoke test completed successfully"
                );
                Verdict::Success(result)
            }
            Err(StepFailure { step, cause }) => {
                if run.receiver_running() {
                    self.stop_receiver(&mut run).await;
                }
                self.compensate(&mut run, &mut stack, step).await;
                run.record(SagaEvent::saga_failed(step, cause.to_string()));
                metrics::counter!("smoketest_failed").increment(1);
                tracing::error!(%step, error = %cause, "smoke test failed");
                Verdict::Failure { step, cause }
            }
        };

        metrics::histogram!("smoketest_duration_seconds").record(started.elapsed().as_secs_f64());
        SagaOutcome { verdict, run }
    }

    async fn forward(
        &self,
        plan: &SmokeTestPlan,
        run: &mut SagaRun,
        stack: &mut CompensationStack,
    ) -> Result<serde_json::Value, StepFailure> {
        let party = plan.party;

        // 1. Create collaboration
        let collaboration_id = self
            .attempt(
                run,
                SagaStep::CreateCollaboration,
                self.coordination.create_collaboration(&plan.collaboration),
            )
            .await?;
        run.record(SagaEvent::step_completed(
            SagaStep::CreateCollaboration,
            Some(collaboration_id.clone()),
            None,
        ));
        tracing::info!(%collaboration_id, "collaboration created");
        stack.push(Compensation::DeleteCollaboration {
            collaboration_id: collaboration_id.clone(),
        });

        // 2. Register input party
        self.attempt(
            run,
            SagaStep::RegisterInputParty,
            self.coordination
                .register_input_party(&collaboration_id, party),
        )
        .await?;
        run.record(SagaEvent::step_completed(
            SagaStep::RegisterInputParty,
            None,
            None,
        ));
        tracing::info!(%collaboration_id, %party, "input party registered");
        stack.push(Compensation::DeregisterInputParty {
            collaboration_id: collaboration_id.clone(),
            party,
        });

        // 3. Start the webhook receiver (local, torn down instead of compensated)
        self.attempt(run, SagaStep::StartReceiver, self.receiver.start())
            .await?;
        run.record(SagaEvent::step_completed(SagaStep::StartReceiver, None, None));
        tracing::info!(callback_url = %plan.callback_url, "webhook receiver listening");

        // 4. Register output party pointing at the receiver
        self.attempt(
            run,
            SagaStep::RegisterOutputParty,
            self.coordination.register_output_party(
                &collaboration_id,
                party,
                &plan.callback_url,
            ),
        )
        .await?;
        run.record(SagaEvent::step_completed(
            SagaStep::RegisterOutputParty,
            None,
            None,
        ));
        tracing::info!(%collaboration_id, %party, "output party registered");
        stack.push(Compensation::DeregisterOutputParty {
            collaboration_id: collaboration_id.clone(),
            party,
        });

        // 5. Upload secret input
        let secret_id = self
            .attempt(
                run,
                SagaStep::UploadSecret,
                self.secrets
                    .upload_secret(&collaboration_id, party, &plan.secret),
            )
            .await?;
        run.record(SagaEvent::step_completed(
            SagaStep::UploadSecret,
            None,
            Some(secret_id.clone()),
        ));
        tracing::info!(%collaboration_id, %secret_id, "secret uploaded");
        stack.push(Compensation::DiscardSecret {
            collaboration_id: collaboration_id.clone(),
            party,
            secret_id,
        });

        // 6. Wait for the completion webhook
        let notification = self
            .attempt(
                run,
                SagaStep::AwaitNotification,
                self.await_notification(plan.notification),
            )
            .await?;
        self.stop_receiver(run).await;
        if notification.collaboration_id.as_ref() != Some(&collaboration_id) {
            tracing::warn!(
                expected = %collaboration_id,
                notified = ?notification.collaboration_id,
                "notification names a different collaboration"
            );
        }
        tracing::info!(
            notified_collaboration = ?notification.collaboration_id,
            result_secret = ?notification.secret_id,
            "notification received"
        );
        run.record(SagaEvent::step_completed(
            SagaStep::AwaitNotification,
            notification.collaboration_id,
            notification.secret_id,
        ));

        // 7. Fetch the result
        let result = self
            .attempt(
                run,
                SagaStep::FetchResult,
                self.secrets.fetch_result(&collaboration_id, party),
            )
            .await?;
        run.record(SagaEvent::step_completed(SagaStep::FetchResult, None, None));
        tracing::info!(%collaboration_id, "result retrieved");

        Ok(result)
    }

    /// Runs one forward action, journaling its start and any failure.
    async fn attempt<T, E>(
        &self,
        run: &mut SagaRun,
        step: SagaStep,
        action: impl Future<Output = Result<T, E>>,
    ) -> Result<T, StepFailure>
    where
        E: Into<SagaError>,
    {
        tracing::info!(%step, "saga step started");
        run.record(SagaEvent::step_started(step));

        action.await.map_err(|err| {
            let cause = err.into();
            tracing::error!(%step, error = %cause, "saga step failed");
            run.record(SagaEvent::step_failed(step, cause.to_string()));
            StepFailure { step, cause }
        })
    }

    /// Sleeps and polls until the notification is ready or the budget runs out.
    async fn await_notification(
        &self,
        policy: NotificationPolicy,
    ) -> Result<NotificationEvent, SagaError> {
        for attempt in 1..=policy.max_attempts {
            tokio::time::sleep(policy.interval).await;

            let event = self.receiver.current();
            if event.is_ready() {
                return Ok(event);
            }
            tracing::info!(
                attempt,
                max_attempts = policy.max_attempts,
                "waiting for notification"
            );
        }

        Err(SagaError::Timeout {
            attempts: policy.max_attempts,
            waited: policy.budget(),
        })
    }

    async fn stop_receiver(&self, run: &mut SagaRun) {
        self.receiver.stop().await;
        run.record(SagaEvent::receiver_stopped());
        tracing::info!("webhook receiver stopped");
    }

    /// Drains the compensation stack in reverse order.
    ///
    /// A failing compensation is recorded and the remaining ones still run.
    #[tracing::instrument(skip(self, run, stack), fields(pending = stack.len()))]
    async fn compensate(
        &self,
        run: &mut SagaRun,
        stack: &mut CompensationStack,
        trigger: SagaStep,
    ) {
        run.record(SagaEvent::compensation_started(trigger, stack.len()));

        while let Some(compensation) = stack.pop() {
            metrics::counter!("smoketest_compensations_total").increment(1);
            match self.run_compensation(&compensation).await {
                Ok(()) => {
                    tracing::info!(
                        compensation = compensation.name(),
                        collaboration_id = %compensation.collaboration_id(),
                        "compensation completed"
                    );
                    run.record(SagaEvent::compensation_step_completed(
                        compensation.name(),
                    ));
                }
                Err(e) => {
                    tracing::error!(
                        compensation = compensation.name(),
                        collaboration_id = %compensation.collaboration_id(),
                        error = %e,
                        "compensation failed"
                    );
                    run.record(SagaEvent::compensation_step_failed(
                        compensation.name(),
                        e.to_string(),
                    ));
                }
            }
        }
    }

    async fn run_compensation(&self, compensation: &Compensation) -> Result<(), ServiceError> {
        if compensation.cascades() {
            tracing::debug!(
                compensation = compensation.name(),
                "released by collaboration deletion"
            );
            return Ok(());
        }

        match compensation {
            Compensation::DeleteCollaboration { collaboration_id } => {
                self.coordination
                    .delete_collaboration(collaboration_id)
                    .await
            }
            Compensation::DeregisterInputParty {
                collaboration_id,
                party,
            } => {
                self.coordination
                    .deregister_input_party(collaboration_id, *party)
                    .await
            }
            Compensation::DeregisterOutputParty { .. } | Compensation::DiscardSecret { .. } => Ok(()),
        }
    }
}
