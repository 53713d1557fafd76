//! Integration scenarios for the marketplace moderation lifecycles, exercised
//! through the public services and the HTTP router.

mod common {
    use std::sync::Arc;

    use watchyard::infra::{LoggingCache, LoggingMailer, MemoryMarketplace};
    use watchyard::moderation::{
        moderation_router, Actor, ApplicationId, ApplicationStatus, Listing, ListingId,
        ListingService, ListingStatus, MemoryRateLimiter, ModerationRouterState, ReportPolicy,
        ReportService, Role, SellerApplication, SellerApplicationService, UserAccount, UserId,
    };

    pub(crate) const ADMIN: &str = "u-admin";
    pub(crate) const SELLER: &str = "u-seller";
    pub(crate) const MEMBER: &str = "u-member";
    pub(crate) const LISTING: &str = "lst-100";
    pub(crate) const APPLICATION: &str = "app-100";

    pub(crate) fn actor(id: &str, role: Role) -> Actor {
        Actor {
            id: UserId(id.to_string()),
            role,
        }
    }

    pub(crate) fn seeded_store() -> Arc<MemoryMarketplace> {
        let store = Arc::new(MemoryMarketplace::new());
        for (id, role) in [
            (ADMIN, Role::Admin),
            (SELLER, Role::Seller),
            (MEMBER, Role::Member),
        ] {
            store.seed_user(UserAccount {
                id: UserId(id.to_string()),
                role,
                email: format!("{id}@watchyard.example"),
                is_verified: false,
                verified_at: None,
            });
        }
        store.seed_listing(Listing {
            id: ListingId(LISTING.to_string()),
            owner_id: UserId(SELLER.to_string()),
            title: "1965 Carrera 2447".to_string(),
            photo_count: 5,
            status: ListingStatus::Draft,
        });
        store.seed_application(SellerApplication {
            id: ApplicationId(APPLICATION.to_string()),
            user_id: UserId(MEMBER.to_string()),
            status: ApplicationStatus::Pending,
            store_name: "Bridge Street Watches".to_string(),
            short_description: "Chronographs and divers, serviced in house".to_string(),
            location_country: "GB".to_string(),
            location_city: "Leeds".to_string(),
            notes: None,
        });
        store
    }

    pub(crate) fn router(store: Arc<MemoryMarketplace>) -> axum::Router {
        let caches = Arc::new(LoggingCache);
        let state = ModerationRouterState {
            listings: Arc::new(ListingService::new(
                store.clone(),
                Arc::new(LoggingMailer),
                caches.clone(),
            )),
            reports: Arc::new(ReportService::new(
                store.clone(),
                Arc::new(MemoryRateLimiter::default()),
                ReportPolicy::default(),
            )),
            sellers: Arc::new(SellerApplicationService::new(store.clone(), caches)),
            directory: store,
        };
        moderation_router(state)
    }

    pub(crate) fn post_json(
        uri: &str,
        payload: &serde_json::Value,
    ) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::post(uri)
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(
                serde_json::to_vec(payload).expect("serialize payload"),
            ))
            .expect("build request")
    }

    pub(crate) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }
}

mod lifecycle {
    use super::common::*;
    use watchyard::infra::{LoggingCache, LoggingMailer, MemoryMarketplace};
    use watchyard::moderation::{
        ListingId, ListingService, ListingStatus, ListingStore, Role, UserDirectory, UserId,
    };
    use std::sync::Arc;

    fn listing_service(
        store: Arc<MemoryMarketplace>,
    ) -> ListingService<MemoryMarketplace, LoggingMailer, LoggingCache> {
        ListingService::new(store, Arc::new(LoggingMailer), Arc::new(LoggingCache))
    }

    #[test]
    fn draft_to_approved_leaves_a_full_audit_trail() {
        let store = seeded_store();
        let service = listing_service(store.clone());
        let listing_id = ListingId(LISTING.to_string());

        service
            .submit(&listing_id, &actor(SELLER, Role::Seller))
            .expect("submit succeeds");
        service
            .approve(&listing_id, &actor(ADMIN, Role::Admin))
            .expect("approve succeeds");

        let audits = store.listing_audits(&listing_id).expect("audits readable");
        let statuses: Vec<_> = audits.iter().map(|audit| audit.status).collect();
        assert_eq!(statuses, vec![ListingStatus::Pending, ListingStatus::Approved]);
        assert_eq!(audits[0].actor_id, UserId(SELLER.to_string()));
        assert_eq!(audits[1].actor_id, UserId(ADMIN.to_string()));
    }

    #[test]
    fn rejected_listings_record_the_admin_decision() {
        let store = seeded_store();
        let service = listing_service(store.clone());
        let listing_id = ListingId(LISTING.to_string());

        service
            .submit(&listing_id, &actor(SELLER, Role::Seller))
            .expect("submit succeeds");
        service
            .reject(
                &listing_id,
                &actor(ADMIN, Role::Admin),
                Some("serial number does not match the case"),
            )
            .expect("reject succeeds");

        let listing = store
            .fetch_listing(&listing_id)
            .expect("fetch")
            .expect("seeded");
        assert_eq!(listing.status, ListingStatus::Rejected);
    }

    #[test]
    fn application_approval_is_visible_through_the_directory() {
        let store = seeded_store();
        let caches = Arc::new(LoggingCache);
        let sellers = watchyard::moderation::SellerApplicationService::new(
            store.clone(),
            caches,
        );

        sellers
            .approve(
                &watchyard::moderation::ApplicationId(APPLICATION.to_string()),
                &actor(ADMIN, Role::Admin),
            )
            .expect("approval succeeds");

        let user = store
            .fetch_user(&UserId(MEMBER.to_string()))
            .expect("fetch")
            .expect("seeded");
        assert!(user.is_verified);
        assert!(store.seller_profile(&UserId(MEMBER.to_string())).is_some());
    }
}

mod routing {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn full_listing_lifecycle_over_http() {
        let store = seeded_store();
        let router = router(store);

        let submit = router
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/listings/{LISTING}/submit"),
                &json!({ "actor_id": SELLER }),
            ))
            .await
            .expect("route executes");
        assert_eq!(submit.status(), StatusCode::OK);
        let payload = read_json_body(submit).await;
        assert_eq!(payload.get("status"), Some(&json!("pending")));

        let approve = router
            .oneshot(post_json(
                &format!("/api/v1/listings/{LISTING}/approve"),
                &json!({ "actor_id": ADMIN }),
            ))
            .await
            .expect("route executes");
        assert_eq!(approve.status(), StatusCode::OK);
        let payload = read_json_body(approve).await;
        assert_eq!(payload.get("status"), Some(&json!("approved")));
    }

    #[tokio::test]
    async fn report_and_resolution_over_http() {
        let store = seeded_store();
        let router = router(store);

        let submit = router
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/listings/{LISTING}/submit"),
                &json!({ "actor_id": SELLER }),
            ))
            .await
            .expect("route executes");
        assert_eq!(submit.status(), StatusCode::OK);

        let file = router
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/listings/{LISTING}/reports"),
                &json!({ "actor_id": MEMBER, "reason": "bracelet in photos is aftermarket" }),
            ))
            .await
            .expect("route executes");
        assert_eq!(file.status(), StatusCode::CREATED);
        let payload = read_json_body(file).await;
        let report_id = payload
            .get("report_id")
            .and_then(serde_json::Value::as_str)
            .expect("report id")
            .to_string();

        let close = router
            .oneshot(post_json(
                &format!("/api/v1/reports/{report_id}/status"),
                &json!({ "actor_id": ADMIN, "status": "closed" }),
            ))
            .await
            .expect("route executes");
        assert_eq!(close.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn seller_application_decision_over_http() {
        let store = seeded_store();
        let router = router(store);

        let approve = router
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/sellers/applications/{APPLICATION}/approve"),
                &json!({ "actor_id": ADMIN }),
            ))
            .await
            .expect("route executes");
        assert_eq!(approve.status(), StatusCode::OK);
        let payload = read_json_body(approve).await;
        assert_eq!(payload.get("store_name"), Some(&json!("Bridge Street Watches")));

        let again = router
            .oneshot(post_json(
                &format!("/api/v1/sellers/applications/{APPLICATION}/approve"),
                &json!({ "actor_id": ADMIN }),
            ))
            .await
            .expect("route executes");
        assert_eq!(again.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn members_cannot_moderate_over_http() {
        let store = seeded_store();
        let router = router(store);

        let submit = router
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/listings/{LISTING}/submit"),
                &json!({ "actor_id": SELLER }),
            ))
            .await
            .expect("route executes");
        assert_eq!(submit.status(), StatusCode::OK);

        let approve = router
            .oneshot(post_json(
                &format!("/api/v1/listings/{LISTING}/approve"),
                &json!({ "actor_id": MEMBER }),
            ))
            .await
            .expect("route executes");
        assert_eq!(approve.status(), StatusCode::FORBIDDEN);
        let payload = read_json_body(approve).await;
        assert_eq!(payload.get("error"), Some(&json!("not authorized")));
    }
}
