use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::moderation::UserId;

use super::domain::{classify_vendor_status, VerificationKind, VerificationStatus};
use super::payload::{first_string, REASON_KEYS, SESSION_ID_KEYS, VERIFICATION_ID_KEYS};
use super::repository::{VerificationStore, VerificationStoreError};
use super::signature::verify_signature;

/// Reconciles vendor webhook callbacks onto local verification records.
///
/// The contract with the vendor is acknowledge-once-authenticated: after the
/// signature and JSON checks pass, every path answers success, otherwise the
/// vendor retries callbacks we can never act on (unknown sessions, payloads
/// without a session id, even store outages, which are logged and picked up
/// by the next delivery).
pub struct WebhookReconciler<S> {
    store: Arc<S>,
    secret: String,
}

/// The two cases that refuse a callback outright.
#[derive(Debug, thiserror::Error)]
pub enum WebhookRejection {
    #[error("signature missing or invalid")]
    Signature,
    #[error("malformed payload: {0}")]
    Payload(serde_json::Error),
}

/// What an accepted callback did. All variants are acknowledged identically;
/// the distinction exists for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Applied {
        user_id: UserId,
        status: VerificationStatus,
    },
    MissingSessionId,
    UnknownSession,
    StoreFailed,
}

impl<S> WebhookReconciler<S>
where
    S: VerificationStore,
{
    pub fn new(store: Arc<S>, secret: String) -> Self {
        Self { store, secret }
    }

    /// Authenticate and apply one callback. The signature covers the raw
    /// body and is checked before any parsing.
    pub fn reconcile(
        &self,
        kind: VerificationKind,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, WebhookRejection> {
        let provided = signature.ok_or(WebhookRejection::Signature)?;
        if !verify_signature(&self.secret, body, provided) {
            return Err(WebhookRejection::Signature);
        }

        let payload: Value = serde_json::from_slice(body).map_err(WebhookRejection::Payload)?;

        let session_id = match first_string(&payload, SESSION_ID_KEYS) {
            Some(id) => id,
            None => {
                info!(kind = kind.label(), "callback carried no session id, ignoring");
                return Ok(WebhookOutcome::MissingSessionId);
            }
        };

        let record = match self.store.find_by_session(kind, session_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!(
                    kind = kind.label(),
                    session = session_id,
                    "callback for unknown session, ignoring"
                );
                return Ok(WebhookOutcome::UnknownSession);
            }
            Err(err) => {
                warn!(kind = kind.label(), error = %err, "session lookup failed");
                return Ok(WebhookOutcome::StoreFailed);
            }
        };

        let raw_status = payload
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let reason = first_string(&payload, REASON_KEYS);
        let mut update = classify_vendor_status(raw_status, reason);
        update.external_verification_id =
            first_string(&payload, VERIFICATION_ID_KEYS).map(str::to_string);

        match self.store.apply_update(&record.user_id, kind, update) {
            Ok(updated) => {
                info!(
                    kind = kind.label(),
                    user = %updated.user_id.0,
                    status = updated.status.label(),
                    "verification callback applied"
                );
                Ok(WebhookOutcome::Applied {
                    user_id: updated.user_id,
                    status: updated.status,
                })
            }
            Err(VerificationStoreError::NotFound) => {
                // The record vanished between lookup and update.
                Ok(WebhookOutcome::UnknownSession)
            }
            Err(err) => {
                warn!(kind = kind.label(), error = %err, "verification update failed");
                Ok(WebhookOutcome::StoreFailed)
            }
        }
    }
}
