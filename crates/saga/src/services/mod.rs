//! Service ports used by the saga and in-memory implementations for tests.

pub mod coordination;
pub mod receiver;
pub mod secrets;

pub use coordination::{CoordinationService, InMemoryCoordinationService};
pub use receiver::{InMemoryReceiver, NotificationReceiver};
pub use secrets::{InMemorySecretService, SecretService};
