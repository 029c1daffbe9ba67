//! Receiver for the coordination service's completion webhook.
//!
//! Exposes exactly one route, `PUT /notify`. A delivery is parsed into a
//! [`NotificationEvent`](common::NotificationEvent) and published through
//! [`NotificationState`]; nothing else happens on the request path.

pub mod error;
pub mod receiver;
pub mod routes;
pub mod state;

use axum::Router;
use axum::routing::put;
use tower_http::trace::TraceLayer;

pub use error::ReceiverError;
pub use receiver::WebhookReceiver;
pub use state::NotificationState;

/// Creates the receiver router.
///
/// Any other path answers 404 and any other method on `/notify` 405.
pub fn create_app(state: NotificationState) -> Router {
    Router::new()
        .route("/notify", put(routes::notify::receive))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
