//! In-memory infrastructure used by the demo server and the test suites.
//! A single mutex guards all marketplace state, which is what makes the
//! multi-record store operations atomic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::identity::{
    VendorClient, VendorError, VendorSession, VerificationKind, VerificationRecord,
    VerificationStatus, VerificationStore, VerificationStoreError, VerificationUpdate,
};
use crate::moderation::{
    ApplicationId, ApplicationStatus, CacheInvalidator, CacheTag, Listing, ListingId,
    ListingStatus, ListingStatusAudit, ListingStore, Mailer, MailerError, OutboundEmail, Report,
    ReportId, ReportStatus, ReportStore, SellerApplication, SellerApplicationStore,
    SellerApproval, SellerProfile, StoreError, UserAccount, UserDirectory, UserId,
};

#[derive(Default)]
struct MarketplaceState {
    users: HashMap<UserId, UserAccount>,
    listings: HashMap<ListingId, Listing>,
    audits: Vec<ListingStatusAudit>,
    reports: HashMap<ReportId, Report>,
    applications: HashMap<ApplicationId, SellerApplication>,
    profiles: HashMap<UserId, SellerProfile>,
    verifications: HashMap<(UserId, VerificationKind), VerificationRecord>,
}

/// In-memory marketplace store implementing every storage trait the services
/// consume. One lock spans all records, so the compound operations (listing
/// transition + audit, application approval, verification mirror) commit as
/// units.
#[derive(Default)]
pub struct MemoryMarketplace {
    state: Mutex<MarketplaceState>,
}

impl MemoryMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: UserAccount) {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        state.users.insert(user.id.clone(), user);
    }

    pub fn seed_listing(&self, listing: Listing) {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        state.listings.insert(listing.id.clone(), listing);
    }

    pub fn seed_application(&self, application: SellerApplication) {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        state
            .applications
            .insert(application.id.clone(), application);
    }

    pub fn seed_verification(&self, record: VerificationRecord) {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        state
            .verifications
            .insert((record.user_id.clone(), record.kind), record);
    }

    pub fn seller_profile(&self, user_id: &UserId) -> Option<SellerProfile> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        state.profiles.get(user_id).cloned()
    }

    pub fn verification(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
    ) -> Option<VerificationRecord> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        state
            .verifications
            .get(&(user_id.clone(), kind))
            .cloned()
    }
}

impl ListingStore for MemoryMarketplace {
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state.listings.get(id).cloned())
    }

    fn transition_listing(
        &self,
        id: &ListingId,
        expected: ListingStatus,
        next: ListingStatus,
        actor: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Listing, StoreError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        let listing = state.listings.get_mut(id).ok_or(StoreError::NotFound)?;
        if listing.status != expected {
            return Err(StoreError::StaleStatus {
                found: listing.status.label(),
            });
        }

        listing.status = next;
        let updated = listing.clone();
        state.audits.push(ListingStatusAudit {
            listing_id: id.clone(),
            actor_id: actor.clone(),
            status: next,
            recorded_at: at,
        });
        Ok(updated)
    }

    fn listing_audits(&self, id: &ListingId) -> Result<Vec<ListingStatusAudit>, StoreError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state
            .audits
            .iter()
            .filter(|audit| &audit.listing_id == id)
            .cloned()
            .collect())
    }
}

impl ReportStore for MemoryMarketplace {
    fn insert_report(&self, report: Report) -> Result<Report, StoreError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        let duplicate = state.reports.values().any(|existing| {
            existing.listing_id == report.listing_id
                && existing.reporter_id == report.reporter_id
                && existing.status == ReportStatus::Open
        });
        if duplicate {
            return Err(StoreError::Conflict);
        }

        state.reports.insert(report.id.clone(), report.clone());
        Ok(report)
    }

    fn fetch_report(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state.reports.get(id).cloned())
    }

    fn open_report_exists(
        &self,
        listing_id: &ListingId,
        reporter_id: &UserId,
    ) -> Result<bool, StoreError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state.reports.values().any(|report| {
            &report.listing_id == listing_id
                && &report.reporter_id == reporter_id
                && report.status == ReportStatus::Open
        }))
    }

    fn set_report_status(&self, id: &ReportId, status: ReportStatus) -> Result<Report, StoreError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        let report = state.reports.get_mut(id).ok_or(StoreError::NotFound)?;
        report.status = status;
        Ok(report.clone())
    }
}

impl SellerApplicationStore for MemoryMarketplace {
    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<SellerApplication>, StoreError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state.applications.get(id).cloned())
    }

    fn approve_application(
        &self,
        id: &ApplicationId,
        at: DateTime<Utc>,
    ) -> Result<SellerApproval, StoreError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        let application = state.applications.get_mut(id).ok_or(StoreError::NotFound)?;
        if application.status == ApplicationStatus::Approved {
            return Err(StoreError::StaleStatus {
                found: application.status.label(),
            });
        }

        application.status = ApplicationStatus::Approved;
        let application = application.clone();

        if let Some(user) = state.users.get_mut(&application.user_id) {
            user.is_verified = true;
            user.verified_at = Some(at);
        }

        let profile = SellerProfile {
            user_id: application.user_id.clone(),
            store_name: application.store_name.clone(),
            short_description: application.short_description.clone(),
            location_country: application.location_country.clone(),
            location_city: application.location_city.clone(),
            approved_at: at,
        };
        state
            .profiles
            .insert(application.user_id.clone(), profile.clone());

        Ok(SellerApproval {
            application,
            profile,
        })
    }

    fn reject_application(
        &self,
        id: &ApplicationId,
        notes: &str,
    ) -> Result<SellerApplication, StoreError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        let application = state.applications.get_mut(id).ok_or(StoreError::NotFound)?;
        if application.status == ApplicationStatus::Rejected {
            return Err(StoreError::StaleStatus {
                found: application.status.label(),
            });
        }

        application.status = ApplicationStatus::Rejected;
        application.notes = Some(notes.to_string());
        Ok(application.clone())
    }
}

impl UserDirectory for MemoryMarketplace {
    fn fetch_user(&self, id: &UserId) -> Result<Option<UserAccount>, StoreError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state.users.get(id).cloned())
    }
}

impl VerificationStore for MemoryMarketplace {
    fn find_by_session(
        &self,
        kind: VerificationKind,
        session_id: &str,
    ) -> Result<Option<VerificationRecord>, VerificationStoreError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state
            .verifications
            .values()
            .find(|record| {
                record.kind == kind
                    && record.external_session_id.as_deref() == Some(session_id)
            })
            .cloned())
    }

    fn apply_update(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
        update: VerificationUpdate,
    ) -> Result<VerificationRecord, VerificationStoreError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        let record = state
            .verifications
            .get_mut(&(user_id.clone(), kind))
            .ok_or(VerificationStoreError::NotFound)?;

        record.status = update.status;
        record.rejection_reason = update.rejection_reason;
        record.status_detail = update.status_detail;
        if update.external_verification_id.is_some() {
            record.external_verification_id = update.external_verification_id;
        }
        let record = record.clone();

        if kind == VerificationKind::Verification {
            if let Some(user) = state.users.get_mut(user_id) {
                let approved = record.status == VerificationStatus::Approved;
                user.is_verified = approved;
                user.verified_at = approved.then(Utc::now);
            }
        }

        Ok(record)
    }

    fn upsert_session(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
        session: &VendorSession,
    ) -> Result<VerificationRecord, VerificationStoreError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        let record = VerificationRecord {
            user_id: user_id.clone(),
            kind,
            status: VerificationStatus::Pending,
            external_session_id: Some(session.id.clone()),
            external_session_url: Some(session.url.clone()),
            external_verification_id: None,
            rejection_reason: None,
            status_detail: None,
        };
        state
            .verifications
            .insert((user_id.clone(), kind), record.clone());
        Ok(record)
    }
}

/// Mailer that records deliveries in the log instead of sending them.
#[derive(Default)]
pub struct LoggingMailer;

impl Mailer for LoggingMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        info!(to = %email.to, template = ?email.template, "email queued");
        Ok(())
    }
}

/// Cache invalidator that only logs the tags it would purge.
#[derive(Default)]
pub struct LoggingCache;

impl CacheInvalidator for LoggingCache {
    fn invalidate(&self, tag: CacheTag) {
        info!(tag = %tag.key(), "cache invalidated");
    }
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Vendor client returning deterministic hosted-flow sessions, for the demo
/// server and tests.
#[derive(Default)]
pub struct StaticVendorClient;

impl VendorClient for StaticVendorClient {
    fn create_session(
        &self,
        reference: &str,
        _callback_url: &str,
    ) -> Result<VendorSession, VendorError> {
        let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let session_id = format!("vs-{id:06}");
        Ok(VendorSession {
            url: format!("https://verify.example/flow/{session_id}?ref={reference}"),
            id: session_id,
        })
    }
}
