//! HTTP adapters for the platform services the smoke test drives.
//!
//! [`CoordinationClient`] covers the collaboration lifecycle and
//! [`SecretClient`] the client service's secret upload and result
//! retrieval. Both implement the saga's service ports.

pub mod coordination;
pub mod error;
pub mod secrets;

pub use coordination::CoordinationClient;
pub use error::ClientError;
pub use secrets::SecretClient;

/// Builds the shared reqwest client.
///
/// No request timeout is set; calls wait for the transport to finish.
pub fn http_client() -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .user_agent(concat!("smoketest/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ClientError::Request)
}

/// Joins a base URI and a path without doubling slashes.
fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Passes a successful response through and turns any other status into
/// [`ClientError::Status`] carrying the response body.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %body, "service returned an error status");
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
