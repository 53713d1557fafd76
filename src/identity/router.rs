use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::moderation::UserId;

use super::domain::VerificationKind;
use super::reconciler::{WebhookReconciler, WebhookRejection};
use super::repository::{VendorClient, VerificationStore};
use super::session::SessionService;
use super::signature::SIGNATURE_HEADER;

/// Shared state for the identity endpoints.
pub struct IdentityRouterState<S, V> {
    pub sessions: Arc<SessionService<S, V>>,
    pub reconciler: Arc<WebhookReconciler<S>>,
}

impl<S, V> Clone for IdentityRouterState<S, V> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            reconciler: Arc::clone(&self.reconciler),
        }
    }
}

/// Router builder exposing session creation and the vendor webhook.
pub fn identity_router<S, V>(state: IdentityRouterState<S, V>) -> Router
where
    S: VerificationStore + 'static,
    V: VendorClient + 'static,
{
    Router::new()
        .route(
            "/api/v1/identity/:kind/sessions",
            post(create_session::<S, V>),
        )
        .route(
            "/api/v1/identity/:kind/webhook",
            post(receive_webhook::<S, V>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSessionRequest {
    user_id: String,
}

fn unknown_kind() -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({ "error": "unknown verification kind" })),
    )
        .into_response()
}

pub(crate) async fn create_session<S, V>(
    State(state): State<IdentityRouterState<S, V>>,
    Path(kind): Path<String>,
    axum::Json(request): axum::Json<CreateSessionRequest>,
) -> Response
where
    S: VerificationStore + 'static,
    V: VendorClient + 'static,
{
    let kind = match VerificationKind::from_path(&kind) {
        Some(kind) => kind,
        None => return unknown_kind(),
    };

    match state
        .sessions
        .initiate(&UserId(request.user_id), kind)
    {
        Ok(record) => (
            StatusCode::CREATED,
            axum::Json(json!({
                "user_id": record.user_id.0,
                "kind": record.kind.label(),
                "status": record.status.label(),
                "session_url": record.external_session_url,
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn receive_webhook<S, V>(
    State(state): State<IdentityRouterState<S, V>>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: VerificationStore + 'static,
    V: VendorClient + 'static,
{
    let kind = match VerificationKind::from_path(&kind) {
        Some(kind) => kind,
        None => return unknown_kind(),
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match state.reconciler.reconcile(kind, &body, signature) {
        Ok(_) => (StatusCode::OK, axum::Json(json!({ "ok": true }))).into_response(),
        Err(WebhookRejection::Signature) => (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({ "error": "invalid signature" })),
        )
            .into_response(),
        Err(WebhookRejection::Payload(_)) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({ "error": "malformed payload" })),
        )
            .into_response(),
    }
}
