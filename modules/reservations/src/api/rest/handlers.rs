use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::rest::auth::Authenticated;
use crate::api::rest::dto::{
    CreateReservationReq, HealthDto, ListReservationsQuery, MeDto, ReservationDto,
    ReservationListDto, RoomDto, StatsDto, TransitionDto, UpdateReservationReq,
};
use crate::api::rest::error::map_error;
use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::api::rest::state::ApiState;
use crate::contract::error::ReservationsError;
use crate::contract::model::{
    ReservationAction, ReservationFilter, ReservationStatus, TimeWindow,
};
use crate::domain::permissions::{allowed_actions, authorize};

fn build_filter(
    state: &ApiState,
    auth: &Authenticated,
    query: ListReservationsQuery,
) -> Result<ReservationFilter, ReservationsError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ReservationStatus>)
        .transpose()
        .map_err(|e| ReservationsError::validation(format!("status: {e}")))?;

    let user_id = if query.mine.unwrap_or(false) {
        Some(auth.actor.identity_id)
    } else {
        query.user_id
    };

    // A single bound is completed from the default calendar window.
    let window = match (query.from, query.to) {
        (None, None) => None,
        (from, to) => {
            let w = state.default_window;
            let around = TimeWindow::around(Utc::now(), w.months_back, w.months_forward);
            Some(TimeWindow::new(
                from.unwrap_or(around.from),
                to.unwrap_or(around.to),
            ))
        }
    };
    if let Some(w) = window {
        if w.from > w.to {
            return Err(ReservationsError::validation("from must not be after to"));
        }
    }

    Ok(ReservationFilter {
        user_id,
        status,
        window,
        ..Default::default()
    })
}

/// List reservations, ordered by start time
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    params(ListReservationsQuery),
    responses(
        (status = 200, description = "Reservations", body = ReservationListDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 401, description = "Unauthenticated", body = Problem),
    ),
    security(("bearer" = []))
)]
pub async fn list_reservations(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    uri: Uri,
    Query(query): Query<ListReservationsQuery>,
) -> Result<Json<ReservationListDto>, ProblemResponse> {
    info!("Listing reservations with query: {:?}", query);

    let filter = build_filter(&state, &auth, query).map_err(|e| map_error(&e, uri.path()))?;

    match state.call(state.service.list_reservations(filter)).await {
        Ok(rows) => {
            let reservations: Vec<ReservationDto> = rows
                .into_iter()
                .map(|r| {
                    let actions = allowed_actions(&auth.actor, &r);
                    ReservationDto::with_actions(r, &actions)
                })
                .collect();
            Ok(Json(ReservationListDto {
                total: reservations.len(),
                reservations,
            }))
        }
        Err(e) => {
            error!("Failed to list reservations: {}", e);
            Err(map_error(&e, uri.path()))
        }
    }
}

/// Get a reservation by id
#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation", body = ReservationDto),
        (status = 404, description = "Not Found", body = Problem),
    ),
    security(("bearer" = []))
)]
pub async fn get_reservation(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<ReservationDto>, ProblemResponse> {
    info!("Getting reservation with id: {}", id);

    match state.call(state.service.get_reservation(id)).await {
        Ok(r) => {
            let actions = allowed_actions(&auth.actor, &r);
            Ok(Json(ReservationDto::with_actions(r, &actions)))
        }
        Err(e) => {
            error!("Failed to get reservation {}: {}", id, e);
            Err(map_error(&e, uri.path()))
        }
    }
}

/// Submit a reservation request (students)
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    request_body = CreateReservationReq,
    responses(
        (status = 201, description = "Created, status pending", body = ReservationDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
    ),
    security(("bearer" = []))
)]
pub async fn create_reservation(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    uri: Uri,
    Json(req_body): Json<CreateReservationReq>,
) -> Result<(StatusCode, Json<ReservationDto>), ProblemResponse> {
    info!("Creating reservation: {:?}", req_body);

    let draft = req_body.into();

    match state
        .call(state.service.create_reservation(&auth.actor, draft))
        .await
    {
        Ok(r) => {
            let actions = allowed_actions(&auth.actor, &r);
            Ok((StatusCode::CREATED, Json(ReservationDto::with_actions(r, &actions))))
        }
        Err(e) => {
            error!("Failed to create reservation: {}", e);
            Err(map_error(&e, uri.path()))
        }
    }
}

/// Edit title, room or time window of an approved reservation
#[utoipa::path(
    patch,
    path = "/reservations/{id}",
    tag = "reservations",
    params(("id" = Uuid, Path, description = "Reservation id")),
    request_body = UpdateReservationReq,
    responses(
        (status = 200, description = "Updated", body = ReservationDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 404, description = "Not Found", body = Problem),
    ),
    security(("bearer" = []))
)]
pub async fn update_reservation(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req_body): Json<UpdateReservationReq>,
) -> Result<Json<ReservationDto>, ProblemResponse> {
    info!("Updating reservation {} with: {:?}", id, req_body);

    let patch = req_body.into();

    match state
        .call(state.service.update_reservation_fields(&auth.actor, id, patch))
        .await
    {
        Ok(r) => {
            let actions = allowed_actions(&auth.actor, &r);
            Ok(Json(ReservationDto::with_actions(r, &actions)))
        }
        Err(e) => {
            error!("Failed to update reservation {}: {}", id, e);
            Err(map_error(&e, uri.path()))
        }
    }
}

/// Hard-delete an approved reservation
#[utoipa::path(
    delete,
    path = "/reservations/{id}",
    tag = "reservations",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 404, description = "Not Found", body = Problem),
    ),
    security(("bearer" = []))
)]
pub async fn delete_reservation(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting reservation: {}", id);

    match state
        .call(state.service.delete_reservation(&auth.actor, id))
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete reservation {}: {}", id, e);
            Err(map_error(&e, uri.path()))
        }
    }
}

async fn transition(
    state: &ApiState,
    auth: &Authenticated,
    id: Uuid,
    action: ReservationAction,
    uri: &Uri,
) -> Result<Json<TransitionDto>, ProblemResponse> {
    info!("Reservation {}: {}", id, action);

    let result = match action {
        ReservationAction::Approve => {
            state
                .call(state.service.approve_reservation(&auth.actor, id))
                .await
        }
        ReservationAction::Reject => {
            state
                .call(state.service.reject_reservation(&auth.actor, id))
                .await
        }
        ReservationAction::Cancel => {
            state
                .call(state.service.cancel_reservation(&auth.actor, id))
                .await
        }
        other => Err(ReservationsError::validation(format!(
            "'{other}' is not a status transition"
        ))),
    };

    match result {
        Ok(t) => Ok(Json(TransitionDto::from(t))),
        Err(e) => {
            error!("Failed to {} reservation {}: {}", action, id, e);
            Err(map_error(&e, uri.path()))
        }
    }
}

/// Approve a pending reservation (staff/admin)
#[utoipa::path(
    post,
    path = "/reservations/{id}/approve",
    tag = "reservations",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Approved, or already approved", body = TransitionDto),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 409, description = "Conflict", body = Problem),
    ),
    security(("bearer" = []))
)]
pub async fn approve_reservation(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<TransitionDto>, ProblemResponse> {
    transition(&state, &auth, id, ReservationAction::Approve, &uri).await
}

/// Reject a pending reservation (staff/admin)
#[utoipa::path(
    post,
    path = "/reservations/{id}/reject",
    tag = "reservations",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Rejected, or already rejected", body = TransitionDto),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 409, description = "Conflict", body = Problem),
    ),
    security(("bearer" = []))
)]
pub async fn reject_reservation(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<TransitionDto>, ProblemResponse> {
    transition(&state, &auth, id, ReservationAction::Reject, &uri).await
}

/// Cancel an own pending reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Cancelled, or already cancelled", body = TransitionDto),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 409, description = "Conflict", body = Problem),
    ),
    security(("bearer" = []))
)]
pub async fn cancel_reservation(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<TransitionDto>, ProblemResponse> {
    transition(&state, &auth, id, ReservationAction::Cancel, &uri).await
}

/// Rooms available for selection
#[utoipa::path(
    get,
    path = "/rooms",
    tag = "rooms",
    responses((status = 200, description = "Rooms by name", body = [RoomDto])),
    security(("bearer" = []))
)]
pub async fn list_rooms(
    Extension(state): Extension<Arc<ApiState>>,
    _auth: Authenticated,
    uri: Uri,
) -> Result<Json<Vec<RoomDto>>, ProblemResponse> {
    match state.call(state.service.list_rooms()).await {
        Ok(rooms) => Ok(Json(rooms.into_iter().map(RoomDto::from).collect())),
        Err(e) => {
            error!("Failed to list rooms: {}", e);
            Err(map_error(&e, uri.path()))
        }
    }
}

/// Caller profile; creates the student record on first call
#[utoipa::path(
    get,
    path = "/me",
    tag = "session",
    responses(
        (status = 200, description = "Profile", body = MeDto),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 503, description = "Profile setup failed", body = Problem),
    ),
    security(("bearer" = []))
)]
pub async fn me(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    uri: Uri,
) -> Result<Json<MeDto>, ProblemResponse> {
    match state.call(state.service.ensure_profile(&auth.identity)).await {
        Ok(profile) => {
            let can_create = authorize(&auth.actor, ReservationAction::Create, None).is_allowed();
            Ok(Json(MeDto::new(
                auth.identity.email.clone(),
                &profile,
                can_create,
            )))
        }
        Err(e) => Err(map_error(&e, uri.path())),
    }
}

/// Dashboard counters
#[utoipa::path(
    get,
    path = "/stats",
    tag = "session",
    responses((status = 200, description = "Counters", body = StatsDto)),
    security(("bearer" = []))
)]
pub async fn stats(
    Extension(state): Extension<Arc<ApiState>>,
    auth: Authenticated,
    uri: Uri,
) -> Result<Json<StatsDto>, ProblemResponse> {
    match state.call(state.service.dashboard_stats(&auth.actor)).await {
        Ok(s) => Ok(Json(StatsDto::from(s))),
        Err(e) => {
            error!("Failed to compute stats: {}", e);
            Err(map_error(&e, uri.path()))
        }
    }
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Alive", body = HealthDto))
)]
pub async fn health() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}
