use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::identity::reconciler::WebhookReconciler;
use crate::identity::router::{identity_router, IdentityRouterState};
use crate::identity::session::SessionService;
use crate::identity::{VerificationKind, VerificationRecord, VerificationStatus};
use crate::infra::{MemoryMarketplace, StaticVendorClient};
use crate::moderation::{Role, UserAccount, UserId};

pub(super) const SECRET: &str = "unit-test-secret";
pub(super) const MEMBER: &str = "u-applicant";
pub(super) const SESSION: &str = "vs-seeded";

pub(super) fn member_account() -> UserAccount {
    UserAccount {
        id: UserId(MEMBER.to_string()),
        role: Role::Member,
        email: format!("{MEMBER}@example.com"),
        is_verified: false,
        verified_at: None,
    }
}

pub(super) fn pending_record(kind: VerificationKind) -> VerificationRecord {
    VerificationRecord {
        user_id: UserId(MEMBER.to_string()),
        kind,
        status: VerificationStatus::Pending,
        external_session_id: Some(SESSION.to_string()),
        external_session_url: Some(format!("https://verify.example/flow/{SESSION}")),
        external_verification_id: None,
        rejection_reason: None,
        status_detail: None,
    }
}

pub(super) fn store_with_pending(kind: VerificationKind) -> Arc<MemoryMarketplace> {
    let store = Arc::new(MemoryMarketplace::new());
    store.seed_user(member_account());
    store.seed_verification(pending_record(kind));
    store
}

pub(super) fn reconciler(store: Arc<MemoryMarketplace>) -> WebhookReconciler<MemoryMarketplace> {
    WebhookReconciler::new(store, SECRET.to_string())
}

pub(super) fn build_router(store: Arc<MemoryMarketplace>) -> axum::Router {
    let sessions = Arc::new(SessionService::new(
        store.clone(),
        Arc::new(StaticVendorClient),
        "https://watchyard.example/api/v1/identity".to_string(),
    ));
    let state = IdentityRouterState {
        sessions,
        reconciler: Arc::new(reconciler(store)),
    };
    identity_router(state)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
