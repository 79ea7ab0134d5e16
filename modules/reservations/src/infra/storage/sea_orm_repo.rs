//! SeaORM-backed implementations of the storage ports.
//!
//! Each repository is generic over `C: ConnectionTrait`, so it can be built
//! with a `DatabaseConnection` or a transaction.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::contract::model::{
    Profile, Reservation, ReservationFilter, ReservationPatch, ReservationStatus, Room,
};
use crate::domain::repo::{ProfilesRepository, ReservationsRepository, RoomsRepository};
use crate::infra::storage::entity::{profile, reservation, room};
use crate::infra::storage::mapper;

fn filter_condition(f: &ReservationFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(id) = f.id {
        cond = cond.add(reservation::Column::Id.eq(id));
    }
    if let Some(user_id) = f.user_id {
        cond = cond.add(reservation::Column::UserId.eq(user_id));
    }
    if let Some(status) = f.status {
        cond = cond.add(reservation::Column::Status.eq(status.as_str()));
    }
    if let Some(window) = f.window {
        cond = cond
            .add(reservation::Column::StartTime.gte(window.from))
            .add(reservation::Column::EndTime.lte(window.to));
    }
    if let Some(after) = f.starts_after {
        cond = cond.add(reservation::Column::StartTime.gt(after));
    }
    cond
}

/// Reservations table.
pub struct SeaOrmReservationsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmReservationsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> ReservationsRepository for SeaOrmReservationsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list(&self, filter: &ReservationFilter) -> anyhow::Result<Vec<Reservation>> {
        let rows = reservation::Entity::find()
            .filter(filter_condition(filter))
            .order_by_asc(reservation::Column::StartTime)
            .all(&self.conn)
            .await
            .context("list reservations failed")?;
        rows.into_iter()
            .map(mapper::reservation_to_contract)
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Reservation>> {
        let found = reservation::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        found.map(mapper::reservation_to_contract).transpose()
    }

    async fn insert(&self, r: &Reservation) -> anyhow::Result<()> {
        let m = reservation::ActiveModel {
            id: Set(r.id),
            room_id: Set(r.room_id),
            user_id: Set(r.user_id),
            title: Set(r.title.clone()),
            start_time: Set(r.start_time),
            end_time: Set(r.end_time),
            status: Set(r.status.as_str().to_string()),
            notes: Set(r.notes.clone()),
            created_at: Set(r.created_at),
            updated_at: Set(r.updated_at),
        };
        let _ = m.insert(&self.conn).await.context("insert failed")?;
        Ok(())
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        next: ReservationStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let res = reservation::Entity::update_many()
            .col_expr(reservation::Column::Status, Expr::value(next.as_str()))
            .col_expr(reservation::Column::UpdatedAt, Expr::value(at))
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::Status.eq(expected.as_str()))
            .exec(&self.conn)
            .await
            .context("update_status_if failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: &ReservationPatch,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut update = reservation::Entity::update_many()
            .col_expr(reservation::Column::UpdatedAt, Expr::value(at))
            .filter(reservation::Column::Id.eq(id));
        if let Some(title) = &patch.title {
            update = update.col_expr(reservation::Column::Title, Expr::value(title.clone()));
        }
        if let Some(room_id) = patch.room_id {
            update = update.col_expr(reservation::Column::RoomId, Expr::value(room_id));
        }
        if let Some(start) = patch.start_time {
            update = update.col_expr(reservation::Column::StartTime, Expr::value(start));
        }
        if let Some(end) = patch.end_time {
            update = update.col_expr(reservation::Column::EndTime, Expr::value(end));
        }
        let res = update
            .exec(&self.conn)
            .await
            .context("update_fields failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = reservation::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn count(&self, filter: &ReservationFilter) -> anyhow::Result<u64> {
        reservation::Entity::find()
            .filter(filter_condition(filter))
            .count(&self.conn)
            .await
            .context("count reservations failed")
    }
}

/// Rooms reference table.
pub struct SeaOrmRoomsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmRoomsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> RoomsRepository for SeaOrmRoomsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list(&self) -> anyhow::Result<Vec<Room>> {
        let rows = room::Entity::find()
            .order_by_asc(room::Column::Name)
            .all(&self.conn)
            .await
            .context("list rooms failed")?;
        Ok(rows.into_iter().map(mapper::room_to_contract).collect())
    }

    async fn exists(&self, id: Uuid) -> anyhow::Result<bool> {
        let count = room::Entity::find_by_id(id)
            .count(&self.conn)
            .await
            .context("room exists failed")?;
        Ok(count > 0)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        room::Entity::find()
            .count(&self.conn)
            .await
            .context("count rooms failed")
    }

    async fn ensure(&self, name: &str) -> anyhow::Result<Room> {
        let existing = room::Entity::find()
            .filter(room::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("find room by name failed")?;
        if let Some(m) = existing {
            return Ok(mapper::room_to_contract(m));
        }

        let m = room::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
        };
        let inserted = m.insert(&self.conn).await.context("insert room failed")?;
        Ok(mapper::room_to_contract(inserted))
    }
}

/// Profiles (role records) table.
pub struct SeaOrmProfilesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmProfilesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> ProfilesRepository for SeaOrmProfilesRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Profile>> {
        let found = profile::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find profile failed")?;
        Ok(found.map(mapper::profile_to_contract))
    }

    async fn insert(&self, p: &Profile) -> anyhow::Result<()> {
        let role = p
            .role
            .map(|r| r.as_str())
            .context("profile without a role cannot be stored")?;
        let m = profile::ActiveModel {
            id: Set(p.id),
            role: Set(role.to_string()),
            email: Set(p.email.clone()),
            created_at: Set(p.created_at),
        };
        let _ = m.insert(&self.conn).await.context("insert profile failed")?;
        Ok(())
    }
}
