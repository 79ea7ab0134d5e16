use anyhow::Context;

use crate::contract::model::{Profile, Reservation, ReservationStatus, Role, Room};
use crate::infra::storage::entity::{profile, reservation, room};

/// Convert a database row to a contract model.
/// Unknown status strings are a data error.
pub fn reservation_to_contract(m: reservation::Model) -> anyhow::Result<Reservation> {
    let status: ReservationStatus = m
        .status
        .parse()
        .with_context(|| format!("reservation {} has invalid status", m.id))?;
    Ok(Reservation {
        id: m.id,
        room_id: m.room_id,
        user_id: m.user_id,
        title: m.title,
        start_time: m.start_time,
        end_time: m.end_time,
        status,
        notes: m.notes,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

/// Unknown role strings map to no role, which grants nothing.
pub fn profile_to_contract(m: profile::Model) -> Profile {
    Profile {
        id: m.id,
        role: m.role.parse::<Role>().ok(),
        email: m.email,
        created_at: m.created_at,
    }
}

pub fn room_to_contract(m: room::Model) -> Room {
    Room {
        id: m.id,
        name: m.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn unknown_role_maps_to_none() {
        let p = profile_to_contract(profile::Model {
            id: Uuid::new_v4(),
            role: "janitor".into(),
            email: None,
            created_at: Utc::now(),
        });
        assert_eq!(p.role, None);
    }

    #[test]
    fn bad_status_is_an_error() {
        let now = Utc::now();
        let err = reservation_to_contract(reservation::Model {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "x".into(),
            start_time: now,
            end_time: now,
            status: "archived".into(),
            notes: None,
            created_at: now,
            updated_at: now,
        })
        .unwrap_err();
        assert!(err.to_string().contains("invalid status"));
    }
}
