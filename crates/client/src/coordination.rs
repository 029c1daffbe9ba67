//! Coordination service client.

use async_trait::async_trait;
use common::{CollaborationId, PartyIndex};
use reqwest::Client;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use saga::{CollaborationSpec, CoordinationService, ServiceError};
use serde::Deserialize;

use crate::error::ClientError;
use crate::{check, endpoint};

/// Response body of `POST /collaboration`. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct CreatedCollaboration {
    id: CollaborationId,
}

/// Client for the coordination service's collaboration API.
#[derive(Debug, Clone)]
pub struct CoordinationClient {
    http: Client,
    base_url: String,
}

impl CoordinationClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    /// `POST /collaboration` with the multipart creation form.
    pub async fn create(&self, spec: &CollaborationSpec) -> Result<CollaborationId, ClientError> {
        let form = Form::new()
            .text("name", spec.name.clone())
            .text("number_of_parties", spec.number_of_parties.to_string())
            .text("csv_header_line", spec.csv_header_line.clone())
            .part(
                "mpc_program",
                Part::bytes(spec.mpc_program.clone())
                    .file_name("mpc_program.mpc")
                    .mime_str("text/plain")?,
            )
            .part(
                "cs_config",
                Part::bytes(spec.cs_config.clone())
                    .file_name("cs_config")
                    .mime_str("text/plain")?,
            );

        let response = self
            .http
            .post(self.url("collaboration"))
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;
        let created: CreatedCollaboration = check(response).await?.json().await?;
        Ok(created.id)
    }

    /// `DELETE /collaboration/{id}`.
    pub async fn delete(&self, id: &CollaborationId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("collaboration/{id}")))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// `POST /collaboration/{id}/register-input-party/{party}`.
    pub async fn register_input(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url(&format!("collaboration/{id}/register-input-party/{party}")))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// `DELETE /collaboration/{id}/register-input-party/{party}`.
    pub async fn deregister_input(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("collaboration/{id}/register-input-party/{party}")))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// `POST /collaboration/{id}/register-output-party/{party}?party_client_endpoint=...`.
    ///
    /// The callback URL is form-encoded into the query string.
    pub async fn register_output(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
        callback_url: &str,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url(&format!("collaboration/{id}/register-output-party/{party}")))
            .query(&[("party_client_endpoint", callback_url)])
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CoordinationService for CoordinationClient {
    async fn create_collaboration(
        &self,
        spec: &CollaborationSpec,
    ) -> Result<CollaborationId, ServiceError> {
        Ok(self.create(spec).await?)
    }

    async fn delete_collaboration(&self, id: &CollaborationId) -> Result<(), ServiceError> {
        Ok(self.delete(id).await?)
    }

    async fn register_input_party(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<(), ServiceError> {
        Ok(self.register_input(id, party).await?)
    }

    async fn deregister_input_party(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<(), ServiceError> {
        Ok(self.deregister_input(id, party).await?)
    }

    async fn register_output_party(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
        callback_url: &str,
    ) -> Result<(), ServiceError> {
        Ok(self.register_output(id, party, callback_url).await?)
    }
}
