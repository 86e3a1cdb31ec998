//! Access control: role and relationship checks.
//!
//! - No IO
//! - No panics
//! - No business logic beyond the check itself
//!
//! Both checks fail with the same generic `Unauthorized` so a caller cannot
//! tell a wrong role from a wrong relationship.

use bazaar_core::{DomainError, DomainResult, UserId};

use crate::{Identity, Role};

/// The two parties bound to a sale at creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SaleParties {
    pub buyer: UserId,
    pub seller: UserId,
}

/// Require the caller to hold exactly `role`.
pub fn require_role(identity: &Identity, role: Role) -> DomainResult<()> {
    if identity.role == role {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            required = %role,
            "role check failed"
        );
        Err(DomainError::forbidden())
    }
}

/// Require the caller to be the buyer or the seller of a sale.
///
/// This answers "may this caller touch the order at all", independent of
/// which transition is being asked for.
pub fn require_party(identity: &Identity, parties: &SaleParties) -> DomainResult<()> {
    if identity.id == parties.buyer || identity.id == parties.seller {
        Ok(())
    } else {
        tracing::warn!(user_id = %identity.id, "caller is not a party to the sale");
        Err(DomainError::forbidden())
    }
}
