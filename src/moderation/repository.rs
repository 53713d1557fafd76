use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, Listing, ListingId, ListingStatus, ListingStatusAudit, Report, ReportId,
    ReportStatus, SellerApplication, SellerProfile, UserAccount, UserId,
};

/// Storage abstraction for listings. The status fields behind these traits
/// are mutated only through the lifecycle services; no other write path
/// should touch them.
pub trait ListingStore: Send + Sync {
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;

    /// Compare-and-set status change persisted together with its audit row.
    /// Both the new status and the audit row commit, or neither does. Fails
    /// with [`StoreError::StaleStatus`] when the current status no longer
    /// matches `expected`, which is how the second of two racing admin
    /// decisions loses.
    fn transition_listing(
        &self,
        id: &ListingId,
        expected: ListingStatus,
        next: ListingStatus,
        actor: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Listing, StoreError>;

    fn listing_audits(&self, id: &ListingId) -> Result<Vec<ListingStatusAudit>, StoreError>;
}

/// Storage abstraction for content reports.
pub trait ReportStore: Send + Sync {
    fn insert_report(&self, report: Report) -> Result<Report, StoreError>;
    fn fetch_report(&self, id: &ReportId) -> Result<Option<Report>, StoreError>;
    fn open_report_exists(
        &self,
        listing_id: &ListingId,
        reporter_id: &UserId,
    ) -> Result<bool, StoreError>;
    /// Idempotent status set; setting the current status again is not an error.
    fn set_report_status(&self, id: &ReportId, status: ReportStatus) -> Result<Report, StoreError>;
}

/// Storage abstraction for seller applications. Approval touches three
/// records, so the store owns the atomicity rather than the service.
pub trait SellerApplicationStore: Send + Sync {
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<SellerApplication>, StoreError>;

    /// One atomic unit: application status to approved, the user's verified
    /// flag and timestamp, and the seller-profile upsert from the application
    /// fields. Fails with [`StoreError::StaleStatus`] when already approved.
    fn approve_application(
        &self,
        id: &ApplicationId,
        at: DateTime<Utc>,
    ) -> Result<SellerApproval, StoreError>;

    /// Sets the status to rejected and records the reason in `notes`. Fails
    /// with [`StoreError::StaleStatus`] when already rejected.
    fn reject_application(
        &self,
        id: &ApplicationId,
        notes: &str,
    ) -> Result<SellerApplication, StoreError>;
}

/// Read access to user accounts for actor resolution and email lookup.
pub trait UserDirectory: Send + Sync {
    fn fetch_user(&self, id: &UserId) -> Result<Option<UserAccount>, StoreError>;
}

/// Result of an application approval, for responses and cache invalidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerApproval {
    pub application: SellerApplication,
    pub profile: SellerProfile,
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("status changed concurrently (now {found})")]
    StaleStatus { found: &'static str },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Notification templates rendered by the email collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    ListingApproved,
    ListingRejected,
}

/// Outbound notification payload so routes and tests can assert the
/// integration boundary without a live mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub to: String,
    pub template: EmailTemplate,
    pub params: BTreeMap<String, String>,
}

/// Trait describing the outbound email hook. Send failures are logged by the
/// caller and never roll back a committed state change.
pub trait Mailer: Send + Sync {
    fn send(&self, email: OutboundEmail) -> Result<(), MailerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("email transport unavailable: {0}")]
    Transport(String),
}

/// Logical read-cache tags invalidated after moderation decisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Listings,
    Home,
    Seller(UserId),
}

impl CacheTag {
    pub fn key(&self) -> String {
        match self {
            CacheTag::Listings => "listings".to_string(),
            CacheTag::Home => "home".to_string(),
            CacheTag::Seller(user) => format!("seller:{}", user.0),
        }
    }
}

/// Fire-and-forget cache invalidation keyed by logical resource.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, tag: CacheTag);
}
