use std::sync::Arc;

use crate::moderation::UserId;

use super::domain::{VerificationKind, VerificationRecord};
use super::repository::{VendorClient, VendorError, VerificationStore, VerificationStoreError};

/// Service opening vendor verification sessions. Each initiation replaces the
/// user's previous record for that kind, so abandoning a flow and starting
/// over needs no cleanup.
pub struct SessionService<S, V> {
    store: Arc<S>,
    vendor: Arc<V>,
    callback_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Vendor(#[from] VendorError),
    #[error(transparent)]
    Store(#[from] VerificationStoreError),
}

impl<S, V> SessionService<S, V>
where
    S: VerificationStore,
    V: VendorClient,
{
    pub fn new(store: Arc<S>, vendor: Arc<V>, callback_url: String) -> Self {
        Self {
            store,
            vendor,
            callback_url,
        }
    }

    /// Create a vendor session and record it locally as pending. The caller
    /// redirects the user to `external_session_url` on the returned record.
    pub fn initiate(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
    ) -> Result<VerificationRecord, SessionError> {
        let reference = format!("{}:{}", kind.label(), user_id.0);
        let session = self
            .vendor
            .create_session(&reference, &self.callback_url)?;
        let record = self.store.upsert_session(user_id, kind, &session)?;
        Ok(record)
    }
}
