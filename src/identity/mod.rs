//! Identity verification against an external vendor: session initiation,
//! signed webhook intake, and reconciliation of vendor callbacks onto local
//! verification records.

pub mod domain;
pub mod payload;
pub mod reconciler;
pub mod repository;
pub mod router;
pub mod session;
pub mod signature;

#[cfg(test)]
mod tests;

pub use domain::{
    classify_vendor_status, VerificationKind, VerificationRecord, VerificationStatus,
    VerificationUpdate,
};
pub use payload::{first_string, REASON_KEYS, SESSION_ID_KEYS, VERIFICATION_ID_KEYS};
pub use reconciler::{WebhookOutcome, WebhookReconciler, WebhookRejection};
pub use repository::{
    VendorClient, VendorError, VendorSession, VerificationStore, VerificationStoreError,
};
pub use router::{identity_router, IdentityRouterState};
pub use session::{SessionError, SessionService};
pub use signature::{sign, verify_signature, SIGNATURE_HEADER};
