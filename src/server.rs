use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;
use watchyard::config::AppConfig;
use watchyard::error::AppError;
use watchyard::identity::{
    identity_router, IdentityRouterState, SessionService, WebhookReconciler,
};
use watchyard::infra::{LoggingCache, LoggingMailer, MemoryMarketplace, StaticVendorClient};
use watchyard::moderation::{
    moderation_router, ListingService, MemoryRateLimiter, ModerationRouterState, ReportPolicy,
    ReportService, SellerApplicationService,
};
use watchyard::telemetry;

use crate::cli::ServeArgs;
use crate::demo::seed_showcase;
use crate::routes::{with_service_routes, AppState};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(MemoryMarketplace::new());
    seed_showcase(&store);

    let mailer = Arc::new(LoggingMailer);
    let caches = Arc::new(LoggingCache);
    let limiter = Arc::new(MemoryRateLimiter::default());

    let moderation_state = ModerationRouterState {
        listings: Arc::new(ListingService::new(
            store.clone(),
            mailer,
            caches.clone(),
        )),
        reports: Arc::new(ReportService::new(
            store.clone(),
            limiter,
            ReportPolicy {
                min_reason_chars: config.moderation.min_report_reason_chars,
                rate_limit: config.moderation.report_rate_limit,
                rate_window: config.moderation.report_rate_window,
            },
        )),
        sellers: Arc::new(SellerApplicationService::new(store.clone(), caches)),
        directory: store.clone(),
    };

    let identity_state = IdentityRouterState {
        sessions: Arc::new(SessionService::new(
            store.clone(),
            Arc::new(StaticVendorClient),
            config.vendor.callback_url.clone(),
        )),
        reconciler: Arc::new(WebhookReconciler::new(
            store,
            config.webhook.shared_secret.clone(),
        )),
    };

    let api = moderation_router(moderation_state).merge(identity_router(identity_state));
    let app = with_service_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "watchyard moderation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
