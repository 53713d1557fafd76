use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::access::{require_role, PermissionError};
use super::domain::{Actor, ListingId, Report, ReportId, ReportStatus, Role};
use super::limiter::RateLimiter;
use super::repository::{ListingStore, ReportStore, StoreError};

/// Policy dials for report intake.
#[derive(Debug, Clone)]
pub struct ReportPolicy {
    pub min_reason_chars: usize,
    pub rate_limit: u32,
    pub rate_window: Duration,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            min_reason_chars: 10,
            rate_limit: 5,
            rate_window: Duration::from_secs(3600),
        }
    }
}

/// Service governing content reports: filing by non-owners and idempotent
/// admin resolution.
pub struct ReportService<S, L> {
    store: Arc<S>,
    limiter: Arc<L>,
    policy: ReportPolicy,
}

/// Error raised by report operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("listing not found")]
    ListingNotFound,
    #[error("report not found")]
    NotFound,
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error("you cannot report your own listing")]
    SelfReport,
    #[error("report reason must be at least {min} characters")]
    ReasonTooShort { min: usize },
    #[error("too many reports filed, retry in {retry_after_secs}s")]
    Throttled { retry_after_secs: u64 },
    #[error("you already have an open report for this listing")]
    Duplicate,
    #[error(transparent)]
    Store(StoreError),
}

static REPORT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_report_id() -> ReportId {
    let id = REPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReportId(format!("rep-{id:06}"))
}

impl<S, L> ReportService<S, L>
where
    S: ListingStore + ReportStore,
    L: RateLimiter,
{
    pub fn new(store: Arc<S>, limiter: Arc<L>, policy: ReportPolicy) -> Self {
        Self {
            store,
            limiter,
            policy,
        }
    }

    /// File a report against a listing. The duplicate check is
    /// check-then-insert, matching the observed behavior; stores may also
    /// enforce (listing, reporter, open) uniqueness at insert time.
    pub fn file(
        &self,
        listing_id: &ListingId,
        reporter: &Actor,
        reason: &str,
    ) -> Result<Report, ReportError> {
        let listing = self
            .store
            .fetch_listing(listing_id)
            .map_err(ReportError::Store)?
            .ok_or(ReportError::ListingNotFound)?;

        if reporter.id == listing.owner_id {
            return Err(ReportError::SelfReport);
        }

        let trimmed = reason.trim();
        if trimmed.chars().count() < self.policy.min_reason_chars {
            return Err(ReportError::ReasonTooShort {
                min: self.policy.min_reason_chars,
            });
        }

        let decision = self.limiter.check(
            &format!("reports:{}", reporter.id.0),
            self.policy.rate_limit,
            self.policy.rate_window,
        );
        if !decision.allowed {
            return Err(ReportError::Throttled {
                retry_after_secs: decision.reset_after.as_secs().max(1),
            });
        }

        if self
            .store
            .open_report_exists(listing_id, &reporter.id)
            .map_err(ReportError::Store)?
        {
            return Err(ReportError::Duplicate);
        }

        let report = Report {
            id: next_report_id(),
            listing_id: listing_id.clone(),
            reporter_id: reporter.id.clone(),
            reason: trimmed.to_string(),
            status: ReportStatus::Open,
            filed_at: Utc::now(),
        };

        self.store.insert_report(report).map_err(|err| match err {
            StoreError::Conflict => ReportError::Duplicate,
            other => ReportError::Store(other),
        })
    }

    /// Set a report's status. Idempotent: no precondition on the current
    /// status, so re-closing a closed report succeeds.
    pub fn set_status(
        &self,
        report_id: &ReportId,
        actor: &Actor,
        status: ReportStatus,
    ) -> Result<Report, ReportError> {
        require_role(actor, Role::Admin)?;
        self.store
            .set_report_status(report_id, status)
            .map_err(|err| match err {
                StoreError::NotFound => ReportError::NotFound,
                other => ReportError::Store(other),
            })
    }
}
