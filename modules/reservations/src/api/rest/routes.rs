use std::sync::Arc;

use axum::{
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::rest::{dto, handlers, problem, state::ApiState};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Room Reservations API", description = "Reservation lifecycle and approvals"),
    paths(
        handlers::list_reservations,
        handlers::get_reservation,
        handlers::create_reservation,
        handlers::update_reservation,
        handlers::delete_reservation,
        handlers::approve_reservation,
        handlers::reject_reservation,
        handlers::cancel_reservation,
        handlers::list_rooms,
        handlers::me,
        handlers::stats,
        handlers::health,
    ),
    components(schemas(
        dto::ReservationDto,
        dto::ReservationListDto,
        dto::CreateReservationReq,
        dto::UpdateReservationReq,
        dto::TransitionDto,
        dto::RoomDto,
        dto::MeDto,
        dto::StatsDto,
        dto::HealthDto,
        problem::Problem,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "reservations", description = "Reservation requests and their lifecycle"),
        (name = "rooms", description = "Room reference data"),
        (name = "session", description = "Caller profile and dashboard"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn register_routes(router: Router, state: Arc<ApiState>) -> Router {
    router
        .route(
            "/reservations",
            get(handlers::list_reservations).post(handlers::create_reservation),
        )
        .route(
            "/reservations/{id}",
            get(handlers::get_reservation)
                .patch(handlers::update_reservation)
                .delete(handlers::delete_reservation),
        )
        .route(
            "/reservations/{id}/approve",
            post(handlers::approve_reservation),
        )
        .route(
            "/reservations/{id}/reject",
            post(handlers::reject_reservation),
        )
        .route(
            "/reservations/{id}/cancel",
            post(handlers::cancel_reservation),
        )
        .route("/rooms", get(handlers::list_rooms))
        .route("/me", get(handlers::me))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(openapi_json))
        .layer(Extension(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for p in [
            "/reservations",
            "/reservations/{id}",
            "/reservations/{id}/approve",
            "/reservations/{id}/reject",
            "/reservations/{id}/cancel",
            "/rooms",
            "/me",
            "/stats",
            "/health",
        ] {
            assert!(paths.contains_key(p), "missing {p}");
        }
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }
}
