use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::infra::MemoryMarketplace;
use crate::moderation::limiter::MemoryRateLimiter;
use crate::moderation::repository::{
    CacheInvalidator, CacheTag, Mailer, MailerError, OutboundEmail,
};
use crate::moderation::router::{moderation_router, ModerationRouterState};
use crate::moderation::{
    Actor, ApplicationId, ApplicationStatus, Listing, ListingId, ListingService, ListingStatus,
    ReportPolicy, ReportService, Role, SellerApplication, SellerApplicationService, UserAccount,
    UserId,
};

pub(super) const ADMIN: &str = "u-admin";
pub(super) const OWNER: &str = "u-owner";
pub(super) const BUYER: &str = "u-buyer";
pub(super) const LISTING: &str = "lst-1";
pub(super) const APPLICATION: &str = "app-1";

pub(super) fn actor(id: &str, role: Role) -> Actor {
    Actor {
        id: UserId(id.to_string()),
        role,
    }
}

pub(super) fn admin() -> Actor {
    actor(ADMIN, Role::Admin)
}

pub(super) fn owner() -> Actor {
    actor(OWNER, Role::Seller)
}

pub(super) fn buyer() -> Actor {
    actor(BUYER, Role::Member)
}

pub(super) fn user(id: &str, role: Role) -> UserAccount {
    UserAccount {
        id: UserId(id.to_string()),
        role,
        email: format!("{id}@example.com"),
        is_verified: role == Role::Seller,
        verified_at: None,
    }
}

pub(super) fn draft_listing(photo_count: u32) -> Listing {
    Listing {
        id: ListingId(LISTING.to_string()),
        owner_id: UserId(OWNER.to_string()),
        title: "1968 Seamaster DeVille".to_string(),
        photo_count,
        status: ListingStatus::Draft,
    }
}

pub(super) fn pending_listing() -> Listing {
    Listing {
        status: ListingStatus::Pending,
        ..draft_listing(3)
    }
}

pub(super) fn application() -> SellerApplication {
    SellerApplication {
        id: ApplicationId(APPLICATION.to_string()),
        user_id: UserId(OWNER.to_string()),
        status: ApplicationStatus::Pending,
        store_name: "Tempus Vintage".to_string(),
        short_description: "Serviced mechanical watches from the 60s and 70s".to_string(),
        location_country: "NL".to_string(),
        location_city: "Delft".to_string(),
        notes: None,
    }
}

pub(super) fn marketplace() -> Arc<MemoryMarketplace> {
    let store = Arc::new(MemoryMarketplace::new());
    store.seed_user(user(ADMIN, Role::Admin));
    store.seed_user(user(OWNER, Role::Seller));
    store.seed_user(user(BUYER, Role::Member));
    store
}

#[derive(Default)]
pub(super) struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    pub(super) fail: bool,
}

impl RecordingMailer {
    pub(super) fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(super) fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        if self.fail {
            return Err(MailerError::Transport("smtp offline".to_string()));
        }
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(email);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct RecordingCache {
    invalidated: Mutex<Vec<CacheTag>>,
}

impl RecordingCache {
    pub(super) fn invalidated(&self) -> Vec<CacheTag> {
        self.invalidated
            .lock()
            .expect("cache mutex poisoned")
            .clone()
    }
}

impl CacheInvalidator for RecordingCache {
    fn invalidate(&self, tag: CacheTag) {
        self.invalidated
            .lock()
            .expect("cache mutex poisoned")
            .push(tag);
    }
}

pub(super) fn tight_policy() -> ReportPolicy {
    ReportPolicy {
        min_reason_chars: 10,
        rate_limit: 2,
        rate_window: Duration::from_secs(60),
    }
}

pub(super) fn build_listing_service() -> (
    ListingService<MemoryMarketplace, RecordingMailer, RecordingCache>,
    Arc<MemoryMarketplace>,
    Arc<RecordingMailer>,
    Arc<RecordingCache>,
) {
    let store = marketplace();
    let mailer = Arc::new(RecordingMailer::default());
    let caches = Arc::new(RecordingCache::default());
    let service = ListingService::new(store.clone(), mailer.clone(), caches.clone());
    (service, store, mailer, caches)
}

pub(super) fn build_report_service() -> (
    ReportService<MemoryMarketplace, MemoryRateLimiter>,
    Arc<MemoryMarketplace>,
) {
    let store = marketplace();
    let limiter = Arc::new(MemoryRateLimiter::default());
    let service = ReportService::new(store.clone(), limiter, tight_policy());
    (service, store)
}

pub(super) fn build_seller_service() -> (
    SellerApplicationService<MemoryMarketplace, RecordingCache>,
    Arc<MemoryMarketplace>,
    Arc<RecordingCache>,
) {
    let store = marketplace();
    let caches = Arc::new(RecordingCache::default());
    let service = SellerApplicationService::new(store.clone(), caches.clone());
    (service, store, caches)
}

pub(super) fn build_router() -> (axum::Router, Arc<MemoryMarketplace>) {
    let store = marketplace();
    let mailer = Arc::new(RecordingMailer::default());
    let caches = Arc::new(RecordingCache::default());
    let limiter = Arc::new(MemoryRateLimiter::default());

    let state = ModerationRouterState {
        listings: Arc::new(ListingService::new(
            store.clone(),
            mailer,
            caches.clone(),
        )),
        reports: Arc::new(ReportService::new(
            store.clone(),
            limiter,
            ReportPolicy::default(),
        )),
        sellers: Arc::new(SellerApplicationService::new(store.clone(), caches)),
        directory: store.clone(),
    };
    (moderation_router(state), store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn post_json(uri: &str, payload: &Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(payload).expect("serialize payload"),
        ))
        .expect("build request")
}
