//! Reservation status state machine.
//!
//! ```text
//!            approve
//!   pending ────────▶ approved
//!      │  └─────────▶ rejected   (reject)
//!      └────────────▶ cancelled  (owner cancel)
//! ```
//!
//! `pending` is the only initial state; the other three are terminal.
//! Requesting the status a reservation already has in a terminal state is
//! an idempotent no-op, not an error.

use thiserror::Error;

use crate::contract::model::ReservationStatus;

/// Status every reservation is created with.
pub const INITIAL_STATUS: ReservationStatus = ReservationStatus::Pending;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status changes from `from` to `to`.
    Applied {
        from: ReservationStatus,
        to: ReservationStatus,
    },
    /// Already in the requested terminal status.
    Unchanged(ReservationStatus),
}

impl Transition {
    pub fn target(&self) -> ReservationStatus {
        match self {
            Transition::Applied { to, .. } => *to,
            Transition::Unchanged(s) => *s,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal status transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: ReservationStatus,
    pub to: ReservationStatus,
}

pub fn is_terminal(status: ReservationStatus) -> bool {
    !matches!(status, ReservationStatus::Pending)
}

/// True only for the three edges out of `pending`.
pub fn is_legal(from: ReservationStatus, to: ReservationStatus) -> bool {
    use ReservationStatus::*;
    matches!(
        (from, to),
        (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled)
    )
}

/// Validate a requested status change.
pub fn transition(
    from: ReservationStatus,
    to: ReservationStatus,
) -> Result<Transition, IllegalTransition> {
    if is_legal(from, to) {
        return Ok(Transition::Applied { from, to });
    }
    if from == to && is_terminal(to) {
        return Ok(Transition::Unchanged(to));
    }
    Err(IllegalTransition { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReservationStatus::*;

    #[test]
    fn pending_moves_to_each_terminal_status() {
        for to in [Approved, Rejected, Cancelled] {
            assert_eq!(
                transition(Pending, to),
                Ok(Transition::Applied { from: Pending, to })
            );
        }
    }

    #[test]
    fn repeated_terminal_transition_is_a_noop() {
        for s in [Approved, Rejected, Cancelled] {
            let t = transition(s, s).unwrap();
            assert_eq!(t, Transition::Unchanged(s));
            assert!(!t.is_applied());
            assert_eq!(t.target(), s);
        }
    }

    #[test]
    fn nothing_leaves_a_terminal_status() {
        for from in [Approved, Rejected, Cancelled] {
            for to in ReservationStatus::ALL {
                if to == from {
                    continue;
                }
                assert_eq!(transition(from, to), Err(IllegalTransition { from, to }));
            }
        }
    }

    #[test]
    fn nothing_returns_to_pending() {
        for from in ReservationStatus::ALL {
            assert!(transition(from, Pending).is_err(), "{from} -> pending");
        }
    }

    #[test]
    fn initial_status_is_the_only_non_terminal_one() {
        assert!(!is_terminal(INITIAL_STATUS));
        let non_terminal: Vec<_> = ReservationStatus::ALL
            .into_iter()
            .filter(|s| !is_terminal(*s))
            .collect();
        assert_eq!(non_terminal, vec![INITIAL_STATUS]);
    }
}
