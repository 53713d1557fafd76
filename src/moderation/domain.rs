use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for marketplace users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Identifier wrapper for content reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub String);

/// Identifier wrapper for seller applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Marketplace roles in ascending order of capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Seller,
    Admin,
}

/// The authenticated principal performing a moderation operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

/// Moderation status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Sold,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
            ListingStatus::Sold => "sold",
        }
    }

    /// Apply a moderation action, rejecting invalid current/target pairs.
    pub fn apply(self, action: ListingAction) -> Result<ListingStatus, InvalidTransition> {
        match (self, action) {
            (ListingStatus::Draft, ListingAction::Submit) => Ok(ListingStatus::Pending),
            (ListingStatus::Pending, ListingAction::Approve) => Ok(ListingStatus::Approved),
            (ListingStatus::Pending, ListingAction::Reject) => Ok(ListingStatus::Rejected),
            (from, action) => Err(InvalidTransition {
                from: from.label(),
                action: action.label(),
            }),
        }
    }
}

/// Moderation actions applicable to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingAction {
    Submit,
    Approve,
    Reject,
}

impl ListingAction {
    pub const fn label(self) -> &'static str {
        match self {
            ListingAction::Submit => "submit",
            ListingAction::Approve => "approve",
            ListingAction::Reject => "reject",
        }
    }
}

/// A seller's for-sale post for a single watch. Only the attributes the
/// moderation core reads are modeled; the catalog fields live elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: UserId,
    pub title: String,
    pub photo_count: u32,
    pub status: ListingStatus,
}

/// Append-only record of a listing status transition. Never mutated after
/// creation; written in the same atomic unit as the status change itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingStatusAudit {
    pub listing_id: ListingId,
    pub actor_id: UserId,
    pub status: ListingStatus,
    pub recorded_at: DateTime<Utc>,
}

/// Status of a content report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Open,
    Closed,
}

impl ReportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReportStatus::Open => "open",
            ReportStatus::Closed => "closed",
        }
    }
}

/// A content report filed against a listing by a non-owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub listing_id: ListingId,
    pub reporter_id: UserId,
    pub reason: String,
    pub status: ReportStatus,
    pub filed_at: DateTime<Utc>,
}

/// Status of a seller-verification application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Apply an admin decision. Approval is guarded against double-approval
    /// only, so a rejected application may still be approved on appeal; the
    /// inverse holds for rejection.
    pub fn apply(self, action: ApplicationAction) -> Result<ApplicationStatus, InvalidTransition> {
        match (self, action) {
            (ApplicationStatus::Approved, ApplicationAction::Approve) => Err(InvalidTransition {
                from: self.label(),
                action: action.label(),
            }),
            (_, ApplicationAction::Approve) => Ok(ApplicationStatus::Approved),
            (ApplicationStatus::Rejected, ApplicationAction::Reject) => Err(InvalidTransition {
                from: self.label(),
                action: action.label(),
            }),
            (_, ApplicationAction::Reject) => Ok(ApplicationStatus::Rejected),
        }
    }
}

/// Admin decisions applicable to a seller application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationAction {
    Approve,
    Reject,
}

impl ApplicationAction {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationAction::Approve => "approve",
            ApplicationAction::Reject => "reject",
        }
    }
}

/// A seller-verification application awaiting admin review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerApplication {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub status: ApplicationStatus,
    pub store_name: String,
    pub short_description: String,
    pub location_country: String,
    pub location_city: String,
    /// Rejection reason recorded by the deciding admin.
    pub notes: Option<String>,
}

/// Public-facing store record, created lazily on first application approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerProfile {
    pub user_id: UserId,
    pub store_name: String,
    pub short_description: String,
    pub location_country: String,
    pub location_city: String,
    pub approved_at: DateTime<Utc>,
}

/// The slice of a user account the moderation and identity cores touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub role: Role,
    pub email: String,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Raised when a status transition is requested from an incompatible state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while status is {from}")]
pub struct InvalidTransition {
    pub from: &'static str,
    pub action: &'static str,
}
