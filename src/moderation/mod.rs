//! Moderation state machines for listings, content reports, and seller
//! applications, plus the capability traits (stores, mailer, cache, rate
//! limiter) they are composed from.

pub mod access;
pub mod domain;
pub mod limiter;
pub mod listings;
pub mod reports;
pub mod repository;
pub mod router;
pub mod sellers;

#[cfg(test)]
mod tests;

pub use access::{has_role, require_owner, require_role, PermissionError};
pub use domain::{
    Actor, ApplicationAction, ApplicationId, ApplicationStatus, InvalidTransition, Listing,
    ListingAction, ListingId, ListingStatus, ListingStatusAudit, Report, ReportId, ReportStatus,
    Role, SellerApplication, SellerProfile, UserAccount, UserId,
};
pub use limiter::{MemoryRateLimiter, RateDecision, RateLimiter};
pub use listings::{ListingError, ListingService};
pub use reports::{ReportError, ReportPolicy, ReportService};
pub use repository::{
    CacheInvalidator, CacheTag, EmailTemplate, ListingStore, Mailer, MailerError, OutboundEmail,
    ReportStore, SellerApplicationStore, SellerApproval, StoreError, UserDirectory,
};
pub use router::{moderation_router, ModerationRouterState};
pub use sellers::{SellerApplicationError, SellerApplicationService};
