//! Completion webhook endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{CollaborationId, NotificationEvent, SecretId};
use serde::Deserialize;

use crate::state::NotificationState;

/// Body the coordination service sends to output parties.
///
/// Only the two identifiers are captured; `message` and `code` are logged.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyBody {
    #[serde(default)]
    pub collaboration_id: Option<CollaborationId>,
    #[serde(default)]
    pub secret_id: Option<SecretId>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<i32>,
}

/// `PUT /notify`: captures the identifiers and acknowledges with an empty 200.
pub async fn receive(
    State(state): State<NotificationState>,
    Json(body): Json<NotifyBody>,
) -> StatusCode {
    tracing::info!(
        collaboration_id = ?body.collaboration_id,
        secret_id = ?body.secret_id,
        code = ?body.code,
        message = body.message.as_deref().unwrap_or_default(),
        "notification received"
    );

    let changed = state.record(NotificationEvent {
        collaboration_id: body.collaboration_id,
        secret_id: body.secret_id,
    });
    if !changed {
        tracing::debug!("notification ignored");
    }

    StatusCode::OK
}
