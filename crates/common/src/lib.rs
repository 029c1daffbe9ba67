//! Identifiers shared by the smoke-test saga, its service adapters and the
//! webhook receiver.

pub mod notification;
pub mod types;

pub use notification::NotificationEvent;
pub use types::{CollaborationId, PartyIndex, SecretId};
