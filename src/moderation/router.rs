use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    Actor, ApplicationId, ListingId, Report, ReportId, ReportStatus, UserId,
};
use super::limiter::RateLimiter;
use super::listings::{ListingError, ListingService};
use super::reports::{ReportError, ReportService};
use super::repository::{
    CacheInvalidator, ListingStore, Mailer, ReportStore, SellerApplicationStore, StoreError,
    UserDirectory,
};
use super::sellers::{SellerApplicationError, SellerApplicationService};

/// Shared state for the moderation endpoints. The services share one store
/// type so the demo server and tests can wire everything to a single
/// in-memory marketplace.
pub struct ModerationRouterState<S, M, C, L> {
    pub listings: Arc<ListingService<S, M, C>>,
    pub reports: Arc<ReportService<S, L>>,
    pub sellers: Arc<SellerApplicationService<S, C>>,
    pub directory: Arc<S>,
}

impl<S, M, C, L> Clone for ModerationRouterState<S, M, C, L> {
    fn clone(&self) -> Self {
        Self {
            listings: Arc::clone(&self.listings),
            reports: Arc::clone(&self.reports),
            sellers: Arc::clone(&self.sellers),
            directory: Arc::clone(&self.directory),
        }
    }
}

/// Router builder exposing the moderation operations.
pub fn moderation_router<S, M, C, L>(state: ModerationRouterState<S, M, C, L>) -> Router
where
    S: ListingStore + ReportStore + SellerApplicationStore + UserDirectory + 'static,
    M: Mailer + 'static,
    C: CacheInvalidator + 'static,
    L: RateLimiter + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings/:listing_id/submit",
            post(submit_listing::<S, M, C, L>),
        )
        .route(
            "/api/v1/listings/:listing_id/approve",
            post(approve_listing::<S, M, C, L>),
        )
        .route(
            "/api/v1/listings/:listing_id/reject",
            post(reject_listing::<S, M, C, L>),
        )
        .route(
            "/api/v1/listings/:listing_id/reports",
            post(file_report::<S, M, C, L>),
        )
        .route(
            "/api/v1/reports/:report_id/status",
            post(set_report_status::<S, M, C, L>),
        )
        .route(
            "/api/v1/sellers/applications/:application_id/approve",
            post(approve_application::<S, M, C, L>),
        )
        .route(
            "/api/v1/sellers/applications/:application_id/reject",
            post(reject_application::<S, M, C, L>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorRequest {
    actor_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectListingRequest {
    actor_id: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileReportRequest {
    actor_id: String,
    reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportStatusRequest {
    actor_id: String,
    status: ReportStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectApplicationRequest {
    actor_id: String,
    reason: String,
}

#[derive(Debug, Serialize)]
struct ListingView {
    listing_id: String,
    owner_id: String,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ReportView {
    report_id: String,
    listing_id: String,
    status: &'static str,
}

impl ReportView {
    fn from_report(report: &Report) -> Self {
        Self {
            report_id: report.id.0.clone(),
            listing_id: report.listing_id.0.clone(),
            status: report.status.label(),
        }
    }
}

/// Session handling is an outer surface; moderation requests carry the acting
/// user's id and the directory supplies the role. An unknown actor gets the
/// same generic response as an unauthorized one.
fn resolve_actor<S: UserDirectory>(directory: &S, actor_id: &str) -> Result<Actor, Response> {
    match directory.fetch_user(&UserId(actor_id.to_string())) {
        Ok(Some(user)) => Ok(Actor {
            id: user.id,
            role: user.role,
        }),
        Ok(None) => Err(not_authorized()),
        Err(err) => Err(store_failure(&err)),
    }
}

fn not_authorized() -> Response {
    (
        StatusCode::FORBIDDEN,
        axum::Json(json!({ "error": "not authorized" })),
    )
        .into_response()
}

fn store_failure(err: &StoreError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

fn listing_error_response(error: ListingError) -> Response {
    match error {
        ListingError::NotFound => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "error": "listing not found" })),
        )
            .into_response(),
        ListingError::Permission(_) => not_authorized(),
        ListingError::MissingPhotos => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": ListingError::MissingPhotos.to_string() })),
        )
            .into_response(),
        ListingError::State(err) => (
            StatusCode::CONFLICT,
            axum::Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        ListingError::Store(err) => store_failure(&err),
    }
}

fn report_error_response(error: ReportError) -> Response {
    match error {
        ReportError::ListingNotFound => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "error": "listing not found" })),
        )
            .into_response(),
        ReportError::NotFound => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "error": "report not found" })),
        )
            .into_response(),
        ReportError::Permission(_) => not_authorized(),
        ReportError::SelfReport | ReportError::ReasonTooShort { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        ReportError::Throttled { retry_after_secs } => (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(json!({
                "error": error.to_string(),
                "retry_after_secs": retry_after_secs,
            })),
        )
            .into_response(),
        ReportError::Duplicate => (
            StatusCode::CONFLICT,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        ReportError::Store(err) => store_failure(&err),
    }
}

fn application_error_response(error: SellerApplicationError) -> Response {
    match error {
        SellerApplicationError::NotFound => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "error": "application not found" })),
        )
            .into_response(),
        SellerApplicationError::Permission(_) => not_authorized(),
        SellerApplicationError::MissingReason => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
        SellerApplicationError::State(err) => (
            StatusCode::CONFLICT,
            axum::Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        SellerApplicationError::Store(err) => store_failure(&err),
    }
}

pub(crate) async fn submit_listing<S, M, C, L>(
    State(state): State<ModerationRouterState<S, M, C, L>>,
    Path(listing_id): Path<String>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    S: ListingStore + ReportStore + SellerApplicationStore + UserDirectory + 'static,
    M: Mailer + 'static,
    C: CacheInvalidator + 'static,
    L: RateLimiter + 'static,
{
    let actor = match resolve_actor(state.directory.as_ref(), &request.actor_id) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state.listings.submit(&ListingId(listing_id), &actor) {
        Ok(listing) => (
            StatusCode::OK,
            axum::Json(ListingView {
                listing_id: listing.id.0,
                owner_id: listing.owner_id.0,
                status: listing.status.label(),
            }),
        )
            .into_response(),
        Err(error) => listing_error_response(error),
    }
}

pub(crate) async fn approve_listing<S, M, C, L>(
    State(state): State<ModerationRouterState<S, M, C, L>>,
    Path(listing_id): Path<String>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    S: ListingStore + ReportStore + SellerApplicationStore + UserDirectory + 'static,
    M: Mailer + 'static,
    C: CacheInvalidator + 'static,
    L: RateLimiter + 'static,
{
    let actor = match resolve_actor(state.directory.as_ref(), &request.actor_id) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state.listings.approve(&ListingId(listing_id), &actor) {
        Ok(listing) => (
            StatusCode::OK,
            axum::Json(ListingView {
                listing_id: listing.id.0,
                owner_id: listing.owner_id.0,
                status: listing.status.label(),
            }),
        )
            .into_response(),
        Err(error) => listing_error_response(error),
    }
}

pub(crate) async fn reject_listing<S, M, C, L>(
    State(state): State<ModerationRouterState<S, M, C, L>>,
    Path(listing_id): Path<String>,
    axum::Json(request): axum::Json<RejectListingRequest>,
) -> Response
where
    S: ListingStore + ReportStore + SellerApplicationStore + UserDirectory + 'static,
    M: Mailer + 'static,
    C: CacheInvalidator + 'static,
    L: RateLimiter + 'static,
{
    let actor = match resolve_actor(state.directory.as_ref(), &request.actor_id) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .listings
        .reject(&ListingId(listing_id), &actor, request.reason.as_deref())
    {
        Ok(listing) => (
            StatusCode::OK,
            axum::Json(ListingView {
                listing_id: listing.id.0,
                owner_id: listing.owner_id.0,
                status: listing.status.label(),
            }),
        )
            .into_response(),
        Err(error) => listing_error_response(error),
    }
}

pub(crate) async fn file_report<S, M, C, L>(
    State(state): State<ModerationRouterState<S, M, C, L>>,
    Path(listing_id): Path<String>,
    axum::Json(request): axum::Json<FileReportRequest>,
) -> Response
where
    S: ListingStore + ReportStore + SellerApplicationStore + UserDirectory + 'static,
    M: Mailer + 'static,
    C: CacheInvalidator + 'static,
    L: RateLimiter + 'static,
{
    let actor = match resolve_actor(state.directory.as_ref(), &request.actor_id) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .reports
        .file(&ListingId(listing_id), &actor, &request.reason)
    {
        Ok(report) => (StatusCode::CREATED, axum::Json(ReportView::from_report(&report)))
            .into_response(),
        Err(error) => report_error_response(error),
    }
}

pub(crate) async fn set_report_status<S, M, C, L>(
    State(state): State<ModerationRouterState<S, M, C, L>>,
    Path(report_id): Path<String>,
    axum::Json(request): axum::Json<ReportStatusRequest>,
) -> Response
where
    S: ListingStore + ReportStore + SellerApplicationStore + UserDirectory + 'static,
    M: Mailer + 'static,
    C: CacheInvalidator + 'static,
    L: RateLimiter + 'static,
{
    let actor = match resolve_actor(state.directory.as_ref(), &request.actor_id) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .reports
        .set_status(&ReportId(report_id), &actor, request.status)
    {
        Ok(report) => (StatusCode::OK, axum::Json(ReportView::from_report(&report)))
            .into_response(),
        Err(error) => report_error_response(error),
    }
}

pub(crate) async fn approve_application<S, M, C, L>(
    State(state): State<ModerationRouterState<S, M, C, L>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    S: ListingStore + ReportStore + SellerApplicationStore + UserDirectory + 'static,
    M: Mailer + 'static,
    C: CacheInvalidator + 'static,
    L: RateLimiter + 'static,
{
    let actor = match resolve_actor(state.directory.as_ref(), &request.actor_id) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .sellers
        .approve(&ApplicationId(application_id), &actor)
    {
        Ok(approval) => (
            StatusCode::OK,
            axum::Json(json!({
                "application_id": approval.application.id.0,
                "user_id": approval.application.user_id.0,
                "status": approval.application.status.label(),
                "store_name": approval.profile.store_name,
            })),
        )
            .into_response(),
        Err(error) => application_error_response(error),
    }
}

pub(crate) async fn reject_application<S, M, C, L>(
    State(state): State<ModerationRouterState<S, M, C, L>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<RejectApplicationRequest>,
) -> Response
where
    S: ListingStore + ReportStore + SellerApplicationStore + UserDirectory + 'static,
    M: Mailer + 'static,
    C: CacheInvalidator + 'static,
    L: RateLimiter + 'static,
{
    let actor = match resolve_actor(state.directory.as_ref(), &request.actor_id) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .sellers
        .reject(&ApplicationId(application_id), &actor, &request.reason)
    {
        Ok(application) => (
            StatusCode::OK,
            axum::Json(json!({
                "application_id": application.id.0,
                "user_id": application.user_id.0,
                "status": application.status.label(),
                "notes": application.notes,
            })),
        )
            .into_response(),
        Err(error) => application_error_response(error),
    }
}
