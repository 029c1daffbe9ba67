//! Client service client: secret upload and result retrieval.

use async_trait::async_trait;
use common::{CollaborationId, PartyIndex, SecretId};
use reqwest::Client;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use saga::{SecretService, SecretUpload, ServiceError};

use crate::error::ClientError;
use crate::{check, endpoint};

/// Client for the client service's secret API.
#[derive(Debug, Clone)]
pub struct SecretClient {
    http: Client,
    base_url: String,
}

impl SecretClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// `POST /secrets/{collab}/{party}` with the CSV as `data_csv`.
    ///
    /// The service answers with an array of stored secret IDs; the first
    /// one identifies the upload.
    pub async fn upload(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
        upload: &SecretUpload,
    ) -> Result<SecretId, ClientError> {
        let form = Form::new().part(
            "data_csv",
            Part::bytes(upload.data_csv.clone())
                .file_name("data_csv")
                .mime_str("text/plain")?,
        );

        let response = self
            .http
            .post(endpoint(&self.base_url, &format!("secrets/{id}/{party}")))
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;
        let ids: Vec<SecretId> = check(response).await?.json().await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| ClientError::Decode("secret upload returned no ids".to_string()))
    }

    /// `GET /result/{collab}/{party}`.
    pub async fn result(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http
            .get(endpoint(&self.base_url, &format!("result/{id}/{party}")))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

#[async_trait]
impl SecretService for SecretClient {
    async fn upload_secret(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
        upload: &SecretUpload,
    ) -> Result<SecretId, ServiceError> {
        Ok(self.upload(id, party, upload).await?)
    }

    async fn fetch_result(
        &self,
        id: &CollaborationId,
        party: PartyIndex,
    ) -> Result<serde_json::Value, ServiceError> {
        Ok(self.result(id, party).await?)
    }
}
