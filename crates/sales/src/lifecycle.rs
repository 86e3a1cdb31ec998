//! Sale status lifecycle.
//!
//! The whole state machine is the [`TRANSITIONS`] table: each status has at
//! most one successor and exactly one role may request it. Anything not in the
//! table (skips, rollbacks, moves out of `Entregue`, a role moving a step that
//! isn't theirs) is rejected the same way, administrators included.

use bazaar_auth::Role;
use bazaar_core::{DomainError, DomainResult};

use crate::SaleStatus;

/// One permitted status move and the role allowed to make it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: SaleStatus,
    pub to: SaleStatus,
    pub actor: Role,
}

pub const TRANSITIONS: [Transition; 3] = [
    Transition {
        from: SaleStatus::Pending,
        to: SaleStatus::Preparing,
        actor: Role::Seller,
    },
    Transition {
        from: SaleStatus::Preparing,
        to: SaleStatus::InTransit,
        actor: Role::Seller,
    },
    Transition {
        from: SaleStatus::InTransit,
        to: SaleStatus::Delivered,
        actor: Role::Customer,
    },
];

/// The transition leaving `current`, if the lifecycle has one.
pub fn transition_for(current: SaleStatus) -> Option<Transition> {
    TRANSITIONS.into_iter().find(|t| t.from == current)
}

/// Compute the status that follows `current` when `role` asks to advance it.
///
/// Pure: the caller is responsible for checking that the requester is a party
/// to the sale and for persisting the result.
pub fn next_status(current: SaleStatus, role: Role) -> DomainResult<SaleStatus> {
    match transition_for(current) {
        Some(t) if t.actor == role => Ok(t.to),
        _ => {
            tracing::debug!(status = %current, role = %role, "status transition not permitted");
            Err(DomainError::forbidden())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn seller_prepares_then_dispatches() {
        assert_eq!(
            next_status(SaleStatus::Pending, Role::Seller),
            Ok(SaleStatus::Preparing)
        );
        assert_eq!(
            next_status(SaleStatus::Preparing, Role::Seller),
            Ok(SaleStatus::InTransit)
        );
    }

    #[test]
    fn customer_confirms_delivery() {
        assert_eq!(
            next_status(SaleStatus::InTransit, Role::Customer),
            Ok(SaleStatus::Delivered)
        );
    }

    #[test]
    fn wrong_actor_is_rejected() {
        assert_eq!(
            next_status(SaleStatus::Pending, Role::Customer),
            Err(DomainError::forbidden())
        );
        assert_eq!(
            next_status(SaleStatus::Preparing, Role::Customer),
            Err(DomainError::forbidden())
        );
        assert_eq!(
            next_status(SaleStatus::InTransit, Role::Seller),
            Err(DomainError::forbidden())
        );
    }

    #[test]
    fn delivered_is_terminal_for_everyone() {
        for role in Role::ALL {
            assert_eq!(
                next_status(SaleStatus::Delivered, role),
                Err(DomainError::forbidden())
            );
        }
    }

    #[test]
    fn administrators_cannot_drive_the_lifecycle() {
        for status in SaleStatus::ALL {
            assert!(next_status(status, Role::Administrator).is_err());
        }
    }

    #[test]
    fn table_follows_the_status_order() {
        for t in TRANSITIONS {
            assert_eq!(t.from.successor(), Some(t.to));
        }
        assert!(transition_for(SaleStatus::Delivered).is_none());
    }

    fn arb_status() -> impl Strategy<Value = SaleStatus> {
        prop::sample::select(SaleStatus::ALL.to_vec())
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn accepted_moves_advance_exactly_one_step(status in arb_status(), role in arb_role()) {
            if let Ok(next) = next_status(status, role) {
                prop_assert_eq!(status.successor(), Some(next));
                prop_assert!(next > status);
            }
        }

        #[test]
        fn each_status_has_at_most_one_permitted_actor(status in arb_status()) {
            let permitted = Role::ALL
                .into_iter()
                .filter(|role| next_status(status, *role).is_ok())
                .count();
            prop_assert!(permitted <= 1);
        }

        #[test]
        fn any_walk_reaches_delivered_in_at_most_three_steps(
            roles in prop::collection::vec(arb_role(), 0..20)
        ) {
            let mut status = SaleStatus::INITIAL;
            let mut moves = 0;
            for role in roles {
                if let Ok(next) = next_status(status, role) {
                    status = next;
                    moves += 1;
                }
            }
            prop_assert!(moves <= 3);
            prop_assert_eq!(moves == 3, status == SaleStatus::Delivered);
        }
    }
}
