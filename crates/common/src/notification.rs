//! Completion notification delivered by the coordination service.

use serde::{Deserialize, Serialize};

use crate::types::{CollaborationId, SecretId};

/// Identifiers captured from the completion webhook.
///
/// Both fields start unset. The event is ready only once a single
/// delivery has carried both of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    #[serde(default)]
    pub collaboration_id: Option<CollaborationId>,
    #[serde(default)]
    pub secret_id: Option<SecretId>,
}

impl NotificationEvent {
    /// Creates a fully populated event.
    pub fn new(collaboration_id: CollaborationId, secret_id: SecretId) -> Self {
        Self {
            collaboration_id: Some(collaboration_id),
            secret_id: Some(secret_id),
        }
    }

    /// Returns true when both identifiers are present.
    pub fn is_ready(&self) -> bool {
        self.collaboration_id.is_some() && self.secret_id.is_some()
    }

    /// Records an incoming delivery.
    ///
    /// Once ready the event is frozen and further deliveries are ignored.
    /// A partial delivery replaces a previous partial one wholesale, so
    /// fields from two different deliveries are never combined.
    /// Returns true if the stored value changed.
    pub fn record(&mut self, incoming: NotificationEvent) -> bool {
        if self.is_ready() || *self == incoming {
            return false;
        }
        *self = incoming;
        true
    }
}
