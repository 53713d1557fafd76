use serde::{Deserialize, Serialize};

use crate::moderation::UserId;

use super::domain::{VerificationKind, VerificationRecord, VerificationUpdate};

/// Storage abstraction for verification records, keyed by (user, kind).
pub trait VerificationStore: Send + Sync {
    /// Look up the record holding the given vendor session id.
    fn find_by_session(
        &self,
        kind: VerificationKind,
        session_id: &str,
    ) -> Result<Option<VerificationRecord>, VerificationStoreError>;

    /// Apply a callback's update. For the verification kind the user's
    /// `is_verified` flag and timestamp are mirrored in the same atomic unit
    /// as the record change.
    fn apply_update(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
        update: VerificationUpdate,
    ) -> Result<VerificationRecord, VerificationStoreError>;

    /// Reset the (user, kind) record to pending with a fresh vendor session,
    /// replacing any previous record.
    fn upsert_session(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
        session: &VendorSession,
    ) -> Result<VerificationRecord, VerificationStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationStoreError {
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A hosted flow created at the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSession {
    pub id: String,
    pub url: String,
}

/// Outbound client for the identity vendor's session API.
pub trait VendorClient: Send + Sync {
    fn create_session(
        &self,
        reference: &str,
        callback_url: &str,
    ) -> Result<VendorSession, VendorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VendorError {
    #[error("identity vendor unavailable: {0}")]
    Unavailable(String),
}
