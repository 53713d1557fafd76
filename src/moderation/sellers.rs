use std::sync::Arc;

use chrono::Utc;

use super::access::{require_role, PermissionError};
use super::domain::{
    Actor, ApplicationAction, ApplicationId, InvalidTransition, Role, SellerApplication,
};
use super::repository::{
    CacheInvalidator, CacheTag, SellerApplicationStore, SellerApproval, StoreError,
};

/// Service deciding seller-verification applications. Approval flips the
/// user's verified flag and materializes the public seller profile in the
/// same store unit as the status change.
pub struct SellerApplicationService<S, C> {
    store: Arc<S>,
    caches: Arc<C>,
}

/// Error raised by seller-application operations.
#[derive(Debug, thiserror::Error)]
pub enum SellerApplicationError {
    #[error("application not found")]
    NotFound,
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error("a rejection reason is required")]
    MissingReason,
    #[error(transparent)]
    State(#[from] InvalidTransition),
    #[error(transparent)]
    Store(StoreError),
}

impl<S, C> SellerApplicationService<S, C>
where
    S: SellerApplicationStore,
    C: CacheInvalidator,
{
    pub fn new(store: Arc<S>, caches: Arc<C>) -> Self {
        Self { store, caches }
    }

    /// Approve an application. Guarded against double-approval; a previously
    /// rejected application may still be approved on appeal.
    pub fn approve(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<SellerApproval, SellerApplicationError> {
        require_role(actor, Role::Admin)?;
        let application = self.fetch(application_id)?;
        application.status.apply(ApplicationAction::Approve)?;

        let approval = self
            .store
            .approve_application(application_id, Utc::now())
            .map_err(|err| Self::map_transition_err(err, ApplicationAction::Approve))?;

        self.caches.invalidate(CacheTag::Listings);
        self.caches.invalidate(CacheTag::Home);
        self.caches
            .invalidate(CacheTag::Seller(approval.application.user_id.clone()));
        Ok(approval)
    }

    /// Reject an application with a mandatory reason, recorded in `notes`.
    pub fn reject(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
        reason: &str,
    ) -> Result<SellerApplication, SellerApplicationError> {
        require_role(actor, Role::Admin)?;
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(SellerApplicationError::MissingReason);
        }

        let application = self.fetch(application_id)?;
        application.status.apply(ApplicationAction::Reject)?;

        self.store
            .reject_application(application_id, trimmed)
            .map_err(|err| Self::map_transition_err(err, ApplicationAction::Reject))
    }

    fn fetch(
        &self,
        application_id: &ApplicationId,
    ) -> Result<SellerApplication, SellerApplicationError> {
        self.store
            .fetch_application(application_id)
            .map_err(SellerApplicationError::Store)?
            .ok_or(SellerApplicationError::NotFound)
    }

    fn map_transition_err(err: StoreError, action: ApplicationAction) -> SellerApplicationError {
        match err {
            StoreError::StaleStatus { found } => SellerApplicationError::State(InvalidTransition {
                from: found,
                action: action.label(),
            }),
            StoreError::NotFound => SellerApplicationError::NotFound,
            other => SellerApplicationError::Store(other),
        }
    }
}
