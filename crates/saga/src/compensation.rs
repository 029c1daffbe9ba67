//! Compensating actions and the LIFO stack that owns them.

use common::{CollaborationId, PartyIndex, SecretId};
use serde::{Deserialize, Serialize};

/// A rollback action for one successful forward step.
///
/// Each variant captures every identifier it needs, so executing it takes
/// no further input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Compensation {
    /// `DELETE /collaboration/{id}`.
    DeleteCollaboration { collaboration_id: CollaborationId },

    /// `DELETE /collaboration/{id}/register-input-party/{party}`.
    DeregisterInputParty {
        collaboration_id: CollaborationId,
        party: PartyIndex,
    },

    /// Output registrations have no delete endpoint; they are released
    /// when the collaboration is deleted.
    DeregisterOutputParty {
        collaboration_id: CollaborationId,
        party: PartyIndex,
    },

    /// Uploaded secrets have no delete endpoint; they are released when
    /// the collaboration is deleted.
    DiscardSecret {
        collaboration_id: CollaborationId,
        party: PartyIndex,
        secret_id: SecretId,
    },
}

impl Compensation {
    /// Returns the compensation name used in logs and the journal.
    pub fn name(&self) -> &'static str {
        match self {
            Compensation::DeleteCollaboration { .. } => "delete_collaboration",
            Compensation::DeregisterInputParty { .. } => "deregister_input_party",
            Compensation::DeregisterOutputParty { .. } => "deregister_output_party",
            Compensation::DiscardSecret { .. } => "discard_secret",
        }
    }

    /// Returns true if this compensation issues no remote call of its own
    /// and relies on a later collaboration deletion.
    pub fn cascades(&self) -> bool {
        matches!(
            self,
            Compensation::DeregisterOutputParty { .. } | Compensation::DiscardSecret { .. }
        )
    }

    /// The collaboration this compensation belongs to.
    pub fn collaboration_id(&self) -> &CollaborationId {
        match self {
            Compensation::DeleteCollaboration { collaboration_id }
            | Compensation::DeregisterInputParty {
                collaboration_id, ..
            }
            | Compensation::DeregisterOutputParty {
                collaboration_id, ..
            }
            | Compensation::DiscardSecret {
                collaboration_id, ..
            } => collaboration_id,
        }
    }
}

impl std::fmt::Display for Compensation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ordered compensations, drained in strict reverse order of pushing.
#[derive(Debug, Clone, Default)]
pub struct CompensationStack {
    entries: Vec<Compensation>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes the compensation for a step that just succeeded.
    pub fn push(&mut self, compensation: Compensation) {
        tracing::debug!(
            compensation = compensation.name(),
            depth = self.entries.len() + 1,
            "compensation pushed"
        );
        self.entries.push(compensation);
    }

    /// Pops the most recently pushed compensation.
    pub fn pop(&mut self) -> Option<Compensation> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compensations in the order they would execute.
    pub fn pending(&self) -> impl Iterator<Item = &Compensation> {
        self.entries.iter().rev()
    }
}
