use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::access::{require_owner, require_role, PermissionError};
use super::domain::{
    Actor, InvalidTransition, Listing, ListingAction, ListingId, ListingStatus, Role,
};
use super::repository::{
    CacheInvalidator, CacheTag, EmailTemplate, ListingStore, Mailer, OutboundEmail, StoreError,
    UserDirectory,
};

/// Service driving a listing through its moderation lifecycle:
/// draft → pending (seller submit) → approved/rejected (admin decision).
pub struct ListingService<S, M, C> {
    store: Arc<S>,
    mailer: Arc<M>,
    caches: Arc<C>,
}

/// Error raised by listing lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("listing not found")]
    NotFound,
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error("a listing needs at least one photo before it can be submitted for review")]
    MissingPhotos,
    #[error(transparent)]
    State(#[from] InvalidTransition),
    #[error(transparent)]
    Store(StoreError),
}

impl<S, M, C> ListingService<S, M, C>
where
    S: ListingStore + UserDirectory,
    M: Mailer,
    C: CacheInvalidator,
{
    pub fn new(store: Arc<S>, mailer: Arc<M>, caches: Arc<C>) -> Self {
        Self {
            store,
            mailer,
            caches,
        }
    }

    /// Submit a draft listing for moderation review. Owner-only, and the
    /// listing must carry at least one photo.
    pub fn submit(&self, listing_id: &ListingId, actor: &Actor) -> Result<Listing, ListingError> {
        let listing = self
            .store
            .fetch_listing(listing_id)
            .map_err(ListingError::Store)?
            .ok_or(ListingError::NotFound)?;

        require_owner(actor, &listing.owner_id)?;
        let next = listing.status.apply(ListingAction::Submit)?;
        if listing.photo_count == 0 {
            return Err(ListingError::MissingPhotos);
        }

        self.transition(listing_id, listing.status, next, actor, ListingAction::Submit)
    }

    /// Approve a pending listing. Commits the status change and audit row,
    /// then invalidates read caches and notifies the owner best-effort.
    pub fn approve(&self, listing_id: &ListingId, actor: &Actor) -> Result<Listing, ListingError> {
        require_role(actor, Role::Admin)?;
        let listing = self
            .store
            .fetch_listing(listing_id)
            .map_err(ListingError::Store)?
            .ok_or(ListingError::NotFound)?;
        let next = listing.status.apply(ListingAction::Approve)?;

        let updated =
            self.transition(listing_id, listing.status, next, actor, ListingAction::Approve)?;

        self.caches.invalidate(CacheTag::Listings);
        self.caches
            .invalidate(CacheTag::Seller(updated.owner_id.clone()));
        self.notify_owner(&updated, EmailTemplate::ListingApproved, None);
        Ok(updated)
    }

    /// Reject a pending listing, optionally passing the reason along to the
    /// owner notification.
    pub fn reject(
        &self,
        listing_id: &ListingId,
        actor: &Actor,
        reason: Option<&str>,
    ) -> Result<Listing, ListingError> {
        require_role(actor, Role::Admin)?;
        let listing = self
            .store
            .fetch_listing(listing_id)
            .map_err(ListingError::Store)?
            .ok_or(ListingError::NotFound)?;
        let next = listing.status.apply(ListingAction::Reject)?;

        let updated =
            self.transition(listing_id, listing.status, next, actor, ListingAction::Reject)?;

        self.notify_owner(&updated, EmailTemplate::ListingRejected, reason);
        Ok(updated)
    }

    fn transition(
        &self,
        listing_id: &ListingId,
        expected: ListingStatus,
        next: ListingStatus,
        actor: &Actor,
        action: ListingAction,
    ) -> Result<Listing, ListingError> {
        self.store
            .transition_listing(listing_id, expected, next, &actor.id, Utc::now())
            .map_err(|err| match err {
                // The second of two racing decisions surfaces as a state error.
                StoreError::StaleStatus { found } => ListingError::State(InvalidTransition {
                    from: found,
                    action: action.label(),
                }),
                StoreError::NotFound => ListingError::NotFound,
                other => ListingError::Store(other),
            })
    }

    /// The state change has already committed when this runs; notification
    /// failure is recorded, never propagated.
    fn notify_owner(&self, listing: &Listing, template: EmailTemplate, reason: Option<&str>) {
        let recipient = match self.store.fetch_user(&listing.owner_id) {
            Ok(Some(user)) => user.email,
            Ok(None) => {
                warn!(
                    listing = %listing.id.0,
                    owner = %listing.owner_id.0,
                    "listing owner missing from directory, skipping notification"
                );
                return;
            }
            Err(err) => {
                warn!(listing = %listing.id.0, error = %err, "owner lookup failed, skipping notification");
                return;
            }
        };

        let mut params = BTreeMap::new();
        params.insert("listing_id".to_string(), listing.id.0.clone());
        params.insert("listing_title".to_string(), listing.title.clone());
        if let Some(reason) = reason {
            params.insert("reason".to_string(), reason.to_string());
        }

        if let Err(err) = self.mailer.send(OutboundEmail {
            to: recipient,
            template,
            params,
        }) {
            warn!(listing = %listing.id.0, error = %err, "owner notification failed");
        }
    }
}
