use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::AuthUser,
    models::event::{Event, EventQuery, GeoFilter, SortBy, SortOrder},
    services::events::{self as event_service, Pagination},
    state::AppState,
};

/// The default proximity radius in kilometers.
const DEFAULT_RADIUS_KM: f64 = 10.0;

/// The raw query string of a listing request.
///
/// Everything is accepted as text so that a malformed value degrades to
/// its default instead of rejecting the request; see [`ListEventsParams::into_query`].
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsParams {
    pub search: Option<String>,
    pub tags: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListEventsParams {
    /// Resolves the raw parameters into an [`EventQuery`].
    ///
    /// Non-parseable numerics fall back to defaults, an incomplete
    /// coordinate pair drops the geo filter, and unknown sort keys fall
    /// back to `date asc`. Listing never fails on a bad query string.
    pub fn into_query(self) -> EventQuery {
        let page = parse_positive(self.page.as_deref()).unwrap_or(1);
        let limit = parse_positive(self.limit.as_deref()).unwrap_or(10);

        let search = self
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());

        let tags = self.tags.map(|raw| {
            raw.split(',')
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect::<Vec<_>>()
        });
        let tags = tags.filter(|tags| !tags.is_empty());

        let geo = match (
            parse_f64(self.lat.as_deref()),
            parse_f64(self.lng.as_deref()),
        ) {
            (Some(lat), Some(lng)) => Some(GeoFilter {
                lat,
                lng,
                radius_km: parse_f64(self.radius.as_deref()).unwrap_or(DEFAULT_RADIUS_KM),
            }),
            _ => None,
        };

        let sort_by = match self.sort_by.as_deref() {
            Some("popularity") => SortBy::Popularity,
            _ => SortBy::Date,
        };
        let sort_order = match self.sort_order.as_deref() {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        };

        EventQuery {
            search,
            tags,
            geo,
            date_from: parse_date(self.date_from.as_deref(), false),
            date_to: parse_date(self.date_to.as_deref(), true),
            sort_by,
            sort_order,
            page,
            limit,
        }
    }
}

fn parse_positive(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.parse::<i64>().ok()).filter(|v| *v >= 1)
}

fn parse_f64(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.parse::<f64>().ok()).filter(|v| v.is_finite())
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
///
/// A plain date becomes the start of that day, or its end when used as an
/// upper bound, so both bounds stay inclusive.
fn parse_date(value: Option<&str>, end_of_day: bool) -> Option<DateTime<Utc>> {
    let value = value?;
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(time.and_utc())
}

/// The request payload for event coordinates.
#[derive(Deserialize, Debug)]
pub struct CoordinatesPayload {
    pub lat: f64,
    pub lng: f64,
}

/// The request payload for an event location.
#[derive(Deserialize, Debug)]
pub struct LocationPayload {
    pub address: String,
    pub coordinates: CoordinatesPayload,
}

/// The request payload for creating an event.
///
/// There is deliberately no `organizer` or `attendees` field: ownership is
/// assigned server-side and membership only moves through RSVP.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub start_time: String,
    pub end_time: String,
    pub location: LocationPayload,
    #[serde(default)]
    pub tags: Vec<String>,
    pub max_attendees: Option<i32>,
    pub image_url: Option<String>,
}

/// The request payload for updating an event. All fields optional.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<LocationPayload>,
    pub tags: Option<Vec<String>>,
    pub max_attendees: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// The response payload for a listing request.
#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<Event>,
    pub pagination: Pagination,
}

/// The response payload wrapping a single event.
#[derive(Serialize)]
pub struct EventResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub event: Event,
}

/// Parses a path segment as an event ID; a malformed ID is a client error,
/// not a missing resource.
fn parse_event_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(vec!["Invalid event ID".to_string()]))
}

/// Lists events, filtered, sorted, and paginated.
#[axum::debug_handler]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListEventsParams>,
) -> Result<Response> {
    let query = params.into_query();
    let (events, pagination) = event_service::list_events(&state, &query).await?;

    Ok((StatusCode::OK, Json(EventsResponse { events, pagination })).into_response())
}

/// Fetches a single event.
#[axum::debug_handler]
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Response> {
    let event_id = parse_event_id(&event_id)?;
    let event = event_service::get_event(&state, &event_id).await?;

    Ok((StatusCode::OK, Json(EventResponse { message: None, event })).into_response())
}

/// Creates a new event owned by the caller.
#[axum::debug_handler]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Response> {
    let event = event_service::create_event(&state, auth.user_id, payload).await?;

    let response = EventResponse {
        message: Some("Event created successfully".to_string()),
        event,
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Updates an event, organizer only.
#[axum::debug_handler]
pub async fn update_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(event_id): Path<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Response> {
    let event_id = parse_event_id(&event_id)?;
    let event = event_service::update_event(&state, auth.user_id, &event_id, payload).await?;

    let response = EventResponse {
        message: Some("Event updated successfully".to_string()),
        event,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Deletes an event, organizer only.
#[axum::debug_handler]
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<Response> {
    let event_id = parse_event_id(&event_id)?;
    event_service::delete_event(&state, auth.user_id, &event_id).await?;

    Ok((StatusCode::OK, r#"{"message":"Event deleted successfully"}"#).into_response())
}
