//! Role-based permission rules.
//!
//! The `can_*` predicates decide which controls a view offers. `authorize`
//! is the single decision function shared by view gating and the service,
//! which re-checks every mutation before it reaches the store.

use std::fmt;

use uuid::Uuid;

use crate::contract::model::{Actor, Reservation, ReservationAction, ReservationStatus, Role};

/// Only the original requester may cancel, and only while pending.
pub fn can_cancel(identity_id: Uuid, reservation: &Reservation) -> bool {
    identity_id == reservation.user_id && reservation.status == ReservationStatus::Pending
}

pub fn can_approve_or_reject(role: Option<Role>, reservation: &Reservation) -> bool {
    is_staff_or_admin(role) && reservation.status == ReservationStatus::Pending
}

/// Editing is offered only after approval.
pub fn can_edit_fields(role: Option<Role>, reservation: &Reservation) -> bool {
    is_staff_or_admin(role) && reservation.status == ReservationStatus::Approved
}

pub fn can_delete(role: Option<Role>, reservation: &Reservation) -> bool {
    is_staff_or_admin(role) && reservation.status == ReservationStatus::Approved
}

pub fn can_create(role: Option<Role>) -> bool {
    role == Some(Role::Student)
}

fn is_staff_or_admin(role: Option<Role>) -> bool {
    role.is_some_and(|r| r.is_staff_or_admin())
}

/// Status a reservation must be in for `action` to apply.
pub fn required_status(action: ReservationAction) -> Option<ReservationStatus> {
    match action {
        ReservationAction::Create => None,
        ReservationAction::Cancel | ReservationAction::Approve | ReservationAction::Reject => {
            Some(ReservationStatus::Pending)
        }
        ReservationAction::EditFields | ReservationAction::Delete => {
            Some(ReservationStatus::Approved)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No role record resolved for the identity.
    NoRole,
    RoleNotAllowed(Role),
    NotOwner,
    StatusNotAllowed(ReservationStatus),
    /// A reservation-level action was checked without a reservation.
    MissingResource,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NoRole => f.write_str("no role assigned"),
            DenyReason::RoleNotAllowed(role) => write!(f, "role '{role}' is not allowed"),
            DenyReason::NotOwner => f.write_str("only the requester may do this"),
            DenyReason::StatusNotAllowed(status) => {
                write!(f, "not allowed while reservation is {status}")
            }
            DenyReason::MissingResource => f.write_str("no reservation given"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Identity and role part of a decision, ignoring reservation status.
///
/// The service uses this split to tell an allowed actor hitting stale state
/// (idempotent no-op or conflict) apart from an actor who may never act.
pub fn authorize_actor(
    actor: &Actor,
    action: ReservationAction,
    resource: Option<&Reservation>,
) -> Decision {
    let Some(role) = actor.role else {
        return Decision::Deny(DenyReason::NoRole);
    };

    match action {
        ReservationAction::Create => {
            if role == Role::Student {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::RoleNotAllowed(role))
            }
        }
        ReservationAction::Cancel => match resource {
            None => Decision::Deny(DenyReason::MissingResource),
            Some(r) if r.user_id == actor.identity_id => Decision::Allow,
            Some(_) => Decision::Deny(DenyReason::NotOwner),
        },
        ReservationAction::Approve
        | ReservationAction::Reject
        | ReservationAction::EditFields
        | ReservationAction::Delete => {
            if resource.is_none() {
                Decision::Deny(DenyReason::MissingResource)
            } else if role.is_staff_or_admin() {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::RoleNotAllowed(role))
            }
        }
    }
}

/// Full decision for `(actor, action, resource)`.
pub fn authorize(
    actor: &Actor,
    action: ReservationAction,
    resource: Option<&Reservation>,
) -> Decision {
    let decision = authorize_actor(actor, action, resource);
    if !decision.is_allowed() {
        return decision;
    }
    match (required_status(action), resource) {
        (Some(required), Some(r)) if r.status != required => {
            Decision::Deny(DenyReason::StatusNotAllowed(r.status))
        }
        _ => Decision::Allow,
    }
}

/// Reservation-level actions `actor` may perform on `reservation` right now.
pub fn allowed_actions(actor: &Actor, reservation: &Reservation) -> Vec<ReservationAction> {
    [
        ReservationAction::Approve,
        ReservationAction::Reject,
        ReservationAction::EditFields,
        ReservationAction::Delete,
        ReservationAction::Cancel,
    ]
    .into_iter()
    .filter(|a| authorize(actor, *a, Some(reservation)).is_allowed())
    .collect()
}
