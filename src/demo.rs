use std::fmt::Display;
use std::sync::Arc;

use clap::Args;
use serde_json::json;
use watchyard::config::AppConfig;
use watchyard::error::AppError;
use watchyard::identity::{sign, SessionService, VerificationKind, WebhookReconciler, SIGNATURE_HEADER};
use watchyard::infra::{LoggingCache, LoggingMailer, MemoryMarketplace, StaticVendorClient};
use watchyard::moderation::{
    Actor, ApplicationId, ApplicationStatus, Listing, ListingId, ListingService, ListingStatus,
    MemoryRateLimiter, ReportPolicy, ReportService, ReportStatus, Role, SellerApplication,
    SellerApplicationService, UserAccount, UserDirectory, UserId,
};

const ADMIN: &str = "u-admin";
const SELLER: &str = "u-lena";
const MEMBER: &str = "u-marco";
const LISTING: &str = "lst-000001";
const APPLICATION: &str = "app-000001";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the identity-verification walkthrough
    #[arg(long)]
    pub(crate) skip_identity: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SignWebhookArgs {
    /// JSON payload to sign, exactly as it will be posted
    pub(crate) payload: String,
    /// Override the configured shared secret
    #[arg(long)]
    pub(crate) secret: Option<String>,
}

/// Fixture data shared by `serve` and `demo` so both expose working records.
pub(crate) fn seed_showcase(store: &MemoryMarketplace) {
    store.seed_user(UserAccount {
        id: UserId(ADMIN.to_string()),
        role: Role::Admin,
        email: "moderation@watchyard.example".to_string(),
        is_verified: true,
        verified_at: None,
    });
    store.seed_user(UserAccount {
        id: UserId(SELLER.to_string()),
        role: Role::Seller,
        email: "lena@watchyard.example".to_string(),
        is_verified: true,
        verified_at: None,
    });
    store.seed_user(UserAccount {
        id: UserId(MEMBER.to_string()),
        role: Role::Member,
        email: "marco@watchyard.example".to_string(),
        is_verified: false,
        verified_at: None,
    });
    store.seed_listing(Listing {
        id: ListingId(LISTING.to_string()),
        owner_id: UserId(SELLER.to_string()),
        title: "1971 Speedmaster Mark II".to_string(),
        photo_count: 4,
        status: ListingStatus::Draft,
    });
    store.seed_application(SellerApplication {
        id: ApplicationId(APPLICATION.to_string()),
        user_id: UserId(MEMBER.to_string()),
        status: ApplicationStatus::Pending,
        store_name: "Canal House Horology".to_string(),
        short_description: "Restored dress watches, papers included where possible".to_string(),
        location_country: "NL".to_string(),
        location_city: "Amsterdam".to_string(),
        notes: None,
    });
}

fn step<E: Display>(err: E) -> AppError {
    AppError::Workflow(err.to_string())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;

    let store = Arc::new(MemoryMarketplace::new());
    seed_showcase(&store);

    let listings = ListingService::new(
        store.clone(),
        Arc::new(LoggingMailer),
        Arc::new(LoggingCache),
    );
    let reports = ReportService::new(
        store.clone(),
        Arc::new(MemoryRateLimiter::default()),
        ReportPolicy::default(),
    );
    let sellers = SellerApplicationService::new(store.clone(), Arc::new(LoggingCache));

    let admin = Actor {
        id: UserId(ADMIN.to_string()),
        role: Role::Admin,
    };
    let seller = Actor {
        id: UserId(SELLER.to_string()),
        role: Role::Seller,
    };
    let member = Actor {
        id: UserId(MEMBER.to_string()),
        role: Role::Member,
    };

    println!("watchyard walkthrough");
    println!("=====================");

    println!("\nListing moderation");
    let listing_id = ListingId(LISTING.to_string());
    let listing = listings.submit(&listing_id, &seller).map_err(step)?;
    println!("  {SELLER} submitted {LISTING}: status {}", listing.status.label());

    let report = reports
        .file(
            &listing_id,
            &member,
            "case photos look lifted from an auction archive",
        )
        .map_err(step)?;
    println!("  {MEMBER} filed report {}: status {}", report.id.0, report.status.label());

    let listing = listings.approve(&listing_id, &admin).map_err(step)?;
    println!("  {ADMIN} approved {LISTING}: status {}", listing.status.label());

    let report = reports
        .set_status(&report.id, &admin, ReportStatus::Closed)
        .map_err(step)?;
    println!("  {ADMIN} closed report {}: status {}", report.id.0, report.status.label());

    println!("\nSeller application");
    let approval = sellers
        .approve(&ApplicationId(APPLICATION.to_string()), &admin)
        .map_err(step)?;
    println!(
        "  {ADMIN} approved {APPLICATION}: store \"{}\" now live",
        approval.profile.store_name
    );

    if !args.skip_identity {
        println!("\nIdentity verification");
        let sessions = SessionService::new(
            store.clone(),
            Arc::new(StaticVendorClient),
            config.vendor.callback_url.clone(),
        );
        let reconciler =
            WebhookReconciler::new(store.clone(), config.webhook.shared_secret.clone());

        let record = sessions
            .initiate(&UserId(MEMBER.to_string()), VerificationKind::Verification)
            .map_err(step)?;
        let session_id = record.external_session_id.unwrap_or_default();
        println!("  {MEMBER} opened vendor session {session_id}");

        let payload = json!({
            "session_id": session_id,
            "status": "approved",
            "verification_id": "vf-demo-1",
        });
        let body = serde_json::to_vec(&payload).map_err(step)?;
        let signature = sign(&config.webhook.shared_secret, &body);
        let outcome = reconciler
            .reconcile(VerificationKind::Verification, &body, Some(&signature))
            .map_err(step)?;
        println!("  vendor callback applied: {outcome:?}");

        let verified = store
            .fetch_user(&UserId(MEMBER.to_string()))
            .map_err(step)?
            .map(|user| user.is_verified)
            .unwrap_or_default();
        println!("  {MEMBER} verified: {verified}");
    }

    println!("\nDone.");
    Ok(())
}

pub(crate) fn run_sign_webhook(args: SignWebhookArgs) -> Result<(), AppError> {
    let secret = match args.secret {
        Some(secret) => secret,
        None => AppConfig::load()?.webhook.shared_secret,
    };

    let signature = sign(&secret, args.payload.as_bytes());
    println!("{SIGNATURE_HEADER}: {signature}");
    Ok(())
}
