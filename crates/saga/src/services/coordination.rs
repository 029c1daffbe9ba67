//! Coordination service port and in-memory implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{CollaborationId, PartyIndex};

use crate::error::ServiceError;
use crate::smoke_test::CollaborationSpec;

/// Collaboration lifecycle operations of the coordination service.
#[async_trait]
pub trait CoordinationService: Send + Sync {
    /// Creates a collaboration and returns its ID.
    async fn create_collaboration(
        &self,
        spec: &CollaborationSpec,
    ) -> Result<CollaborationId, ServiceError>;

    /// Deletes a collaboration together with everything registered on it.
    async fn delete_collaboration(&self, id: &CollaborationId) -> Result<(), ServiceError>;

    /// Registers an input party.
    async fn register_input_party(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<(), ServiceError>;

    /// Removes an input party registration.
    async fn deregister_input_party(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<(), ServiceError>;

    /// Registers an output party that is notified at `callback_url`.
    async fn register_output_party(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
        callback_url: &str,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default, Clone)]
struct CollaborationRecord {
    input_parties: BTreeSet<PartyIndex>,
    output_parties: BTreeMap<PartyIndex, String>,
}

#[derive(Debug, Default)]
struct InMemoryCoordinationState {
    collaborations: HashMap<CollaborationId, CollaborationRecord>,
    next_id: u32,
    calls: Vec<String>,
    fail_on_create: bool,
    fail_on_register_input: bool,
    fail_on_register_output: bool,
    fail_on_deregister_input: bool,
    fail_on_delete: bool,
}

fn injected(status: u16) -> ServiceError {
    ServiceError::Status {
        status,
        body: "injected failure".to_string(),
    }
}

fn not_found(id: &CollaborationId) -> ServiceError {
    ServiceError::Status {
        status: 404,
        body: format!("collaboration {id} not found"),
    }
}

/// In-memory coordination service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCoordinationService {
    state: Arc<RwLock<InMemoryCoordinationState>>,
}

impl InMemoryCoordinationService {
    /// Creates a new in-memory coordination service.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    pub fn set_fail_on_register_input(&self, fail: bool) {
        self.state.write().unwrap().fail_on_register_input = fail;
    }

    pub fn set_fail_on_register_output(&self, fail: bool) {
        self.state.write().unwrap().fail_on_register_output = fail;
    }

    pub fn set_fail_on_deregister_input(&self, fail: bool) {
        self.state.write().unwrap().fail_on_deregister_input = fail;
    }

    pub fn set_fail_on_delete(&self, fail: bool) {
        self.state.write().unwrap().fail_on_delete = fail;
    }

    /// Returns the number of live collaborations.
    pub fn collaboration_count(&self) -> usize {
        self.state.read().unwrap().collaborations.len()
    }

    /// Returns true if the collaboration exists.
    pub fn has_collaboration(&self, id: &CollaborationId) -> bool {
        self.state.read().unwrap().collaborations.contains_key(id)
    }

    /// Returns the number of input parties registered on a collaboration.
    pub fn input_party_count(&self, id: &CollaborationId) -> usize {
        self.state
            .read()
            .unwrap()
            .collaborations
            .get(id)
            .map_or(0, |c| c.input_parties.len())
    }

    /// Returns the callback registered for an output party.
    pub fn output_party_endpoint(&self, id: &CollaborationId, party: PartyIndex) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .collaborations
            .get(id)
            .and_then(|c| c.output_parties.get(&party).cloned())
    }

    /// Returns every call received, in order, as `"operation id"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.state.read().unwrap().calls.clone()
    }
}

#[async_trait]
impl CoordinationService for InMemoryCoordinationService {
    async fn create_collaboration(
        &self,
        _spec: &CollaborationSpec,
    ) -> Result<CollaborationId, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push("create_collaboration".to_string());

        if state.fail_on_create {
            return Err(injected(500));
        }

        state.next_id += 1;
        let id = CollaborationId::new(state.next_id.to_string());
        state
            .collaborations
            .insert(id.clone(), CollaborationRecord::default());
        Ok(id)
    }

    async fn delete_collaboration(&self, id: &CollaborationId) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(format!("delete_collaboration {id}"));

        if state.fail_on_delete {
            return Err(injected(500));
        }
        state
            .collaborations
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    async fn register_input_party(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(format!("register_input_party {id}"));

        if state.fail_on_register_input {
            return Err(injected(500));
        }
        let collab = state.collaborations.get_mut(id).ok_or_else(|| not_found(id))?;
        collab.input_parties.insert(party);
        Ok(())
    }

    async fn deregister_input_party(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(format!("deregister_input_party {id}"));

        if state.fail_on_deregister_input {
            return Err(injected(500));
        }
        let collab = state.collaborations.get_mut(id).ok_or_else(|| not_found(id))?;
        collab.input_parties.remove(&party);
        Ok(())
    }

    async fn register_output_party(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
        callback_url: &str,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(format!("register_output_party {id}"));

        if state.fail_on_register_output {
            return Err(injected(500));
        }
        let collab = state.collaborations.get_mut(id).ok_or_else(|| not_found(id))?;
        collab
            .output_parties
            .insert(party, callback_url.to_string());
        Ok(())
    }
}
