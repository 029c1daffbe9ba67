//! Saga orchestration for the MPC platform smoke test.
//!
//! One run drives a collaboration through the platform's public APIs:
//! 1. Create a collaboration
//! 2. Register an input party
//! 3. Start the webhook receiver
//! 4. Register an output party pointing at the receiver
//! 5. Upload secret input
//! 6. Wait for the completion webhook
//! 7. Fetch the result
//!
//! Each step that creates remote state pushes a compensation. Whatever the
//! outcome, the stack is drained in reverse order before the verdict.

pub mod compensation;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod run;
pub mod services;
pub mod state;
pub mod verdict;

pub use compensation::{Compensation, CompensationStack};
pub use coordinator::SmokeTestCoordinator;
pub use error::{SagaError, ServiceError};
pub use events::SagaEvent;
pub use run::SagaRun;
pub use services::{
    CoordinationService, InMemoryCoordinationService, InMemoryReceiver, InMemorySecretService,
    NotificationReceiver, SecretService,
};
pub use smoke_test::{CollaborationSpec, NotificationPolicy, SecretUpload, SmokeTestPlan};
pub use state::{SagaState, SagaStep};
pub use verdict::{EXIT_FAILURE, EXIT_SUCCESS, SagaOutcome, Verdict};
