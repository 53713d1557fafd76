use serde_json::json;

use super::common::*;
use crate::identity::domain::GENERIC_REJECTION;
use crate::identity::signature::sign;
use crate::identity::{VerificationKind, VerificationStatus, WebhookOutcome, WebhookRejection};
use crate::moderation::{UserDirectory, UserId};

fn signed_body(payload: &serde_json::Value) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(payload).expect("serialize payload");
    let signature = sign(SECRET, &body);
    (body, signature)
}

#[test]
fn approval_callback_verifies_the_user() {
    let store = store_with_pending(VerificationKind::Verification);
    let reconciler = reconciler(store.clone());

    let (body, signature) = signed_body(&json!({
        "session_id": SESSION,
        "status": "approved",
        "verification_id": "vf-900",
    }));
    let outcome = reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("authenticated callback");

    assert_eq!(
        outcome,
        WebhookOutcome::Applied {
            user_id: UserId(MEMBER.to_string()),
            status: VerificationStatus::Approved,
        }
    );

    let user = store
        .fetch_user(&UserId(MEMBER.to_string()))
        .expect("fetch")
        .expect("seeded");
    assert!(user.is_verified);

    let record = store
        .verification(&UserId(MEMBER.to_string()), VerificationKind::Verification)
        .expect("record present");
    assert_eq!(record.external_verification_id.as_deref(), Some("vf-900"));
}

#[test]
fn authentication_callbacks_never_touch_the_account() {
    let store = store_with_pending(VerificationKind::Authentication);
    let reconciler = reconciler(store.clone());

    let (body, signature) = signed_body(&json!({
        "session_id": SESSION,
        "status": "approved",
    }));
    reconciler
        .reconcile(VerificationKind::Authentication, &body, Some(&signature))
        .expect("authenticated callback");

    let user = store
        .fetch_user(&UserId(MEMBER.to_string()))
        .expect("fetch")
        .expect("seeded");
    assert!(!user.is_verified);
}

#[test]
fn decline_records_the_reason_with_a_generic_fallback() {
    let store = store_with_pending(VerificationKind::Verification);
    let reconciler = reconciler(store.clone());

    let (body, signature) = signed_body(&json!({
        "session_id": SESSION,
        "status": "declined",
        "message": "document unreadable",
    }));
    reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("authenticated callback");

    let record = store
        .verification(&UserId(MEMBER.to_string()), VerificationKind::Verification)
        .expect("record present");
    assert_eq!(record.status, VerificationStatus::Rejected);
    assert_eq!(record.rejection_reason.as_deref(), Some("document unreadable"));

    let (body, signature) = signed_body(&json!({
        "session_id": SESSION,
        "status": "failed",
    }));
    reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("authenticated callback");
    let record = store
        .verification(&UserId(MEMBER.to_string()), VerificationKind::Verification)
        .expect("record present");
    assert_eq!(record.rejection_reason.as_deref(), Some(GENERIC_REJECTION));
}

#[test]
fn a_later_decline_revokes_a_prior_approval() {
    let store = store_with_pending(VerificationKind::Verification);
    let reconciler = reconciler(store.clone());

    let (body, signature) = signed_body(&json!({ "session_id": SESSION, "status": "approved" }));
    reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("approval applies");

    let (body, signature) = signed_body(&json!({ "session_id": SESSION, "status": "declined" }));
    reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("decline applies");

    let user = store
        .fetch_user(&UserId(MEMBER.to_string()))
        .expect("fetch")
        .expect("seeded");
    assert!(!user.is_verified, "the latest callback is authoritative");
}

#[test]
fn replayed_callbacks_converge() {
    let store = store_with_pending(VerificationKind::Verification);
    let reconciler = reconciler(store.clone());

    let (body, signature) = signed_body(&json!({ "session_id": SESSION, "status": "approved" }));
    let first = reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("first delivery");
    let second = reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("replayed delivery");
    assert_eq!(first, second);

    let record = store
        .verification(&UserId(MEMBER.to_string()), VerificationKind::Verification)
        .expect("record present");
    assert_eq!(record.status, VerificationStatus::Approved);
}

#[test]
fn session_id_falls_back_through_the_candidate_keys() {
    let store = store_with_pending(VerificationKind::Verification);
    let reconciler = reconciler(store.clone());

    let (body, signature) = signed_body(&json!({ "id": SESSION, "status": "approved" }));
    let outcome = reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("authenticated callback");
    assert!(matches!(outcome, WebhookOutcome::Applied { .. }));
}

#[test]
fn missing_session_id_and_unknown_sessions_are_acknowledged() {
    let store = store_with_pending(VerificationKind::Verification);
    let reconciler = reconciler(store);

    let (body, signature) = signed_body(&json!({ "status": "approved" }));
    let outcome = reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("authenticated callback");
    assert_eq!(outcome, WebhookOutcome::MissingSessionId);

    let (body, signature) = signed_body(&json!({ "session_id": "vs-elsewhere", "status": "approved" }));
    let outcome = reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("authenticated callback");
    assert_eq!(outcome, WebhookOutcome::UnknownSession);
}

#[test]
fn unsigned_and_tampered_callbacks_are_rejected_before_parsing() {
    let store = store_with_pending(VerificationKind::Verification);
    let reconciler = reconciler(store);

    // Unparseable body, but the signature failure wins.
    let err = reconciler
        .reconcile(VerificationKind::Verification, b"not json", None)
        .expect_err("missing signature");
    assert!(matches!(err, WebhookRejection::Signature));

    let (body, signature) = signed_body(&json!({ "session_id": SESSION, "status": "approved" }));
    let mut tampered = body.clone();
    tampered[0] ^= 0x01;
    let err = reconciler
        .reconcile(VerificationKind::Verification, &tampered, Some(&signature))
        .expect_err("tampered body");
    assert!(matches!(err, WebhookRejection::Signature));
}

#[test]
fn signed_garbage_is_a_payload_rejection() {
    let store = store_with_pending(VerificationKind::Verification);
    let reconciler = reconciler(store);

    let body = b"][ not json".to_vec();
    let signature = crate::identity::signature::sign(SECRET, &body);
    let err = reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect_err("malformed payload");
    assert!(matches!(err, WebhookRejection::Payload(_)));
}

#[test]
fn unknown_vendor_status_parks_the_record_as_pending() {
    let store = store_with_pending(VerificationKind::Verification);
    let reconciler = reconciler(store.clone());

    let (body, signature) = signed_body(&json!({
        "session_id": SESSION,
        "status": "resubmission_requested",
        "reason": "glare on the document",
    }));
    reconciler
        .reconcile(VerificationKind::Verification, &body, Some(&signature))
        .expect("authenticated callback");

    let record = store
        .verification(&UserId(MEMBER.to_string()), VerificationKind::Verification)
        .expect("record present");
    assert_eq!(record.status, VerificationStatus::Pending);
    assert_eq!(record.status_detail.as_deref(), Some("glare on the document"));
}
