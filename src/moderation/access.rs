use super::domain::{Actor, Role, UserId};

/// Raised when an actor lacks rights over the target resource. Routers
/// deliberately surface this as a generic "not authorized" message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    #[error("this action requires the {0:?} role")]
    MissingRole(Role),
    #[error("only the resource owner may perform this action")]
    NotOwner,
}

/// Capability check used uniformly by every lifecycle operation. Admins
/// subsume the seller role; every authenticated user is at least a member.
pub fn has_role(actor: &Actor, role: Role) -> bool {
    match role {
        Role::Member => true,
        Role::Seller => matches!(actor.role, Role::Seller | Role::Admin),
        Role::Admin => matches!(actor.role, Role::Admin),
    }
}

pub fn require_role(actor: &Actor, role: Role) -> Result<(), PermissionError> {
    if has_role(actor, role) {
        Ok(())
    } else {
        Err(PermissionError::MissingRole(role))
    }
}

pub fn require_owner(actor: &Actor, owner: &UserId) -> Result<(), PermissionError> {
    if actor.id == *owner {
        Ok(())
    } else {
        Err(PermissionError::NotOwner)
    }
}
