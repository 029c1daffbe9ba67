//! MPC platform smoke test.
//!
//! Wires the HTTP clients and the webhook receiver into the saga
//! coordinator and runs it once.

pub mod config;
pub mod inputs;

use client::{ClientError, CoordinationClient, SecretClient};
use saga::{SagaOutcome, SmokeTestCoordinator, Verdict};
use thiserror::Error;
use webhook::WebhookReceiver;

use crate::config::{Config, ConfigError};
use crate::inputs::InputError;

/// Failures before the saga starts. No remote state exists yet.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] ClientError),
}

/// Runs one smoke test against the configured platform.
pub async fn run(config: &Config) -> Result<SagaOutcome, SetupError> {
    let plan = inputs::load_plan(config).await?;

    let http = client::http_client()?;
    let coordination = CoordinationClient::new(http.clone(), &config.coord_service_uri);
    let secrets = SecretClient::new(http, &config.client_service_uri);
    let receiver =
        WebhookReceiver::new(config.bind_addr()?).with_startup_delay(config.receiver_startup);

    tracing::info!(
        coord = %config.coord_service_uri,
        client = %config.client_service_uri,
        callback = %config.callback_url,
        "starting smoke test"
    );

    let coordinator = SmokeTestCoordinator::new(coordination, secrets, receiver);
    Ok(coordinator.execute(&plan).await)
}

/// Logs the verdict and returns the exit code.
pub fn report(outcome: &SagaOutcome) -> i32 {
    let code = outcome.exit_code();
    match &outcome.verdict {
        Verdict::Success(result) => {
            tracing::info!(result = %result, exit_code = code, "smoke test passed");
        }
        Verdict::Failure { step, cause } => {
            tracing::error!(
                %step,
                error = %cause,
                compensations = ?outcome.run.compensations_executed(),
                exit_code = code,
                "smoke test failed"
            );
        }
    }
    code
}
