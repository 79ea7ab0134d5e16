use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::contract::error::ReservationsError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.example.com/{}", code))
        .with_code(code)
        .with_instance(instance);

    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

pub fn unauthenticated(instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::UNAUTHORIZED,
        "RESERVATIONS_UNAUTHENTICATED",
        "Unauthenticated",
        "A valid bearer token is required",
        instance,
    )
}

/// Map a contract error to an RFC 9457 ProblemResponse
pub fn map_error(e: &ReservationsError, instance: &str) -> ProblemResponse {
    match e {
        ReservationsError::NotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "RESERVATIONS_NOT_FOUND",
            "Not found",
            e.to_string(),
            instance,
        ),
        ReservationsError::Forbidden { .. } => from_parts(
            StatusCode::FORBIDDEN,
            "RESERVATIONS_FORBIDDEN",
            "Forbidden",
            e.to_string(),
            instance,
        ),
        ReservationsError::Conflict { .. } => from_parts(
            StatusCode::CONFLICT,
            "RESERVATIONS_STATUS_CONFLICT",
            "Status conflict",
            e.to_string(),
            instance,
        ),
        ReservationsError::Validation { message } => from_parts(
            StatusCode::BAD_REQUEST,
            "RESERVATIONS_VALIDATION",
            "Validation error",
            message.clone(),
            instance,
        ),
        ReservationsError::Timeout => from_parts(
            StatusCode::GATEWAY_TIMEOUT,
            "RESERVATIONS_TIMEOUT",
            "Store timeout",
            "The store did not answer in time; retry the action",
            instance,
        ),
        ReservationsError::ProfileSetup { .. } => {
            tracing::error!(error = ?e, "Profile setup failed");
            from_parts(
                StatusCode::SERVICE_UNAVAILABLE,
                "RESERVATIONS_PROFILE_SETUP",
                "Profile setup failed",
                "The session could not be prepared",
                instance,
            )
        }
        ReservationsError::Internal => from_parts(
            StatusCode::INTERNAL_SERVER_ERROR,
            "RESERVATIONS_INTERNAL",
            "Internal error",
            "An internal error occurred",
            instance,
        ),
    }
}
