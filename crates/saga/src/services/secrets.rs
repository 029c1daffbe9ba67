//! Client/secret service port and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{CollaborationId, PartyIndex, SecretId};

use crate::error::ServiceError;
use crate::smoke_test::SecretUpload;

/// Secret upload and result retrieval on the client service.
#[async_trait]
pub trait SecretService: Send + Sync {
    /// Uploads secret input for a party and returns the stored secret's ID.
    async fn upload_secret(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
        upload: &SecretUpload,
    ) -> Result<SecretId, ServiceError>;

    /// Fetches the computation result for a party.
    async fn fetch_result(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<serde_json::Value, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemorySecretState {
    secrets: HashMap<SecretId, (CollaborationId, PartyIndex, Vec<u8>)>,
    results: HashMap<(CollaborationId, PartyIndex), serde_json::Value>,
    next_id: u32,
    fail_on_upload: bool,
    fail_on_fetch: bool,
}

/// In-memory client service for testing.
///
/// Results are not computed; [`set_result`](Self::set_result) stages the
/// payload a later fetch returns.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretService {
    state: Arc<RwLock<InMemorySecretState>>,
}

impl InMemorySecretService {
    /// Creates a new in-memory secret service.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_upload(&self, fail: bool) {
        self.state.write().unwrap().fail_on_upload = fail;
    }

    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.state.write().unwrap().fail_on_fetch = fail;
    }

    /// Stages the result returned for a collaboration and party.
    pub fn set_result(&self, id: CollaborationId, party: PartyIndex, result: serde_json::Value) {
        self.state.write().unwrap().results.insert((id, party), result);
    }

    /// Returns the number of uploaded secrets.
    pub fn secret_count(&self) -> usize {
        self.state.read().unwrap().secrets.len()
    }
}

#[async_trait]
impl SecretService for InMemorySecretService {
    async fn upload_secret(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
        upload: &SecretUpload,
    ) -> Result<SecretId, ServiceError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_upload {
            return Err(ServiceError::Status {
                status: 500,
                body: "injected failure".to_string(),
            });
        }

        state.next_id += 1;
        let secret_id = SecretId::new(format!("SECRET-{:04}", state.next_id));
        state
            .secrets
            .insert(secret_id.clone(), (id.clone(), party, upload.data_csv.clone()));
        Ok(secret_id)
    }

    async fn fetch_result(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<serde_json::Value, ServiceError> {
        let state = self.state.read().unwrap();

        if state.fail_on_fetch {
            return Err(ServiceError::Status {
                status: 500,
                body: "injected failure".to_string(),
            });
        }

        state
            .results
            .get(&(id.clone(), party))
            .cloned()
            .ok_or_else(|| ServiceError::Status {
                status: 404,
                body: format!("no result for collaboration {id} party {party}"),
            })
    }
}
