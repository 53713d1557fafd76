use serde::{Deserialize, Serialize};

use crate::moderation::UserId;

/// Fallback shown to users when the vendor declines without a reason.
pub const GENERIC_REJECTION: &str = "The verification could not be completed.";

/// The two vendor flows we reconcile. Identity verification feeds the user's
/// verified flag; authentication is a per-transaction liveness check and
/// never touches the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKind {
    Verification,
    Authentication,
}

impl VerificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationKind::Verification => "verification",
            VerificationKind::Authentication => "authentication",
        }
    }

    /// Parse the path segment used by the session and webhook routes.
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "verification" => Some(VerificationKind::Verification),
            "authentication" => Some(VerificationKind::Authentication),
            _ => None,
        }
    }
}

/// Local status of a vendor-driven verification flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
    Canceled,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::Canceled => "canceled",
        }
    }
}

/// Local mirror of one vendor flow. At most one record exists per
/// (user, kind); re-initiation overwrites the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub user_id: UserId,
    pub kind: VerificationKind,
    pub status: VerificationStatus,
    pub external_session_id: Option<String>,
    pub external_session_url: Option<String>,
    pub external_verification_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub status_detail: Option<String>,
}

/// The fields a single vendor callback is authoritative for. Applying the
/// same update twice converges to the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationUpdate {
    pub status: VerificationStatus,
    pub external_verification_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub status_detail: Option<String>,
}

/// Map the vendor's status vocabulary onto the local status, carrying the
/// payload's reason into the matching detail field. Unrecognized statuses
/// stay pending rather than failing, so vocabulary drift on the vendor side
/// degrades gracefully.
pub fn classify_vendor_status(raw_status: &str, reason: Option<&str>) -> VerificationUpdate {
    let normalized = raw_status.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "approved" | "completed" | "verified" | "success" => VerificationUpdate {
            status: VerificationStatus::Approved,
            external_verification_id: None,
            rejection_reason: None,
            status_detail: None,
        },
        "declined" | "failed" => VerificationUpdate {
            status: VerificationStatus::Rejected,
            external_verification_id: None,
            rejection_reason: Some(
                reason
                    .map(str::to_string)
                    .unwrap_or_else(|| GENERIC_REJECTION.to_string()),
            ),
            status_detail: None,
        },
        "canceled" => VerificationUpdate {
            status: VerificationStatus::Canceled,
            external_verification_id: None,
            rejection_reason: None,
            status_detail: reason.map(str::to_string),
        },
        _ => VerificationUpdate {
            status: VerificationStatus::Pending,
            external_verification_id: None,
            rejection_reason: None,
            status_detail: reason.map(str::to_string),
        },
    }
}
