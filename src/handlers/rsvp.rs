use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::{AuthUser, resolve_identity},
    services::rsvp as rsvp_service,
    state::AppState,
};

/// The response payload for an RSVP toggle.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub message: String,
    pub is_attending: bool,
    pub attendee_count: i32,
}

/// The response payload for an RSVP status check.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_attending: bool,
    pub attendee_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<i32>,
}

fn parse_event_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(vec!["Invalid event ID".to_string()]))
}

/// Toggles the caller's attendance on an event.
#[axum::debug_handler]
pub async fn toggle_rsvp(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<Response> {
    let event_id = parse_event_id(&event_id)?;

    let outcome = rsvp_service::toggle(&state, &event_id, auth.user_id).await?;

    let message = if outcome.is_attending {
        "RSVP successful"
    } else {
        "RSVP removed successfully"
    };

    let response = ToggleResponse {
        message: message.to_string(),
        is_attending: outcome.is_attending,
        attendee_count: outcome.attendee_count,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Reports the caller's attendance status on an event.
///
/// Anonymous and invalid-token callers are served the event's true
/// attendee count with `isAttending` false.
#[axum::debug_handler]
pub async fn rsvp_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    cookies: Cookies,
    Path(event_id): Path<String>,
) -> Result<Response> {
    let event_id = parse_event_id(&event_id)?;
    let identity = resolve_identity(&state, &headers, &cookies);

    let (outcome, max_attendees) = rsvp_service::status(&state, &event_id, identity).await?;

    let response = StatusResponse {
        is_attending: outcome.is_attending,
        attendee_count: outcome.attendee_count,
        max_attendees,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
