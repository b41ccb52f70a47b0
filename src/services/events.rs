use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::handlers::events::{CreateEventRequest, UpdateEventRequest};
use crate::models::event::{Coordinates, Event, EventQuery, Location};
use crate::repositories::event as event_repo;
use crate::state::AppState;
use crate::validation::event::{normalize_tags, validate_event};

/// Pagination metadata for a listing response.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// Runs a listing specification and assembles its pagination metadata.
///
/// An out-of-range page comes back as an empty page, never an error.
pub async fn list_events(state: &AppState, query: &EventQuery) -> Result<(Vec<Event>, Pagination)> {
    let (events, total) = event_repo::search_events(&state.db, query).await?;

    let pagination = Pagination {
        page: query.page,
        limit: query.limit,
        total,
        pages: (total + query.limit - 1) / query.limit,
    };

    Ok((events, pagination))
}

/// Fetches a single event by ID.
pub async fn get_event(state: &AppState, event_id: &Uuid) -> Result<Event> {
    event_repo::find_by_id(&state.db, event_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Creates a new event owned by `user_id`.
///
/// The organizer is assigned server-side; whatever the client sent is not
/// representable in the request schema. Attendees start empty.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `user_id` - The authenticated user, who becomes the organizer.
/// * `req` - The event payload.
///
/// # Returns
///
/// A `Result` containing the created `Event`.
pub async fn create_event(
    state: &AppState,
    user_id: Uuid,
    req: CreateEventRequest,
) -> Result<Event> {
    let now = Utc::now();
    let event = Event {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        description: req.description,
        organizer: user_id,
        date: req.date,
        start_time: req.start_time,
        end_time: req.end_time,
        location: Location {
            address: req.location.address.trim().to_string(),
            coordinates: Coordinates {
                lat: req.location.coordinates.lat,
                lng: req.location.coordinates.lng,
            },
        },
        tags: normalize_tags(req.tags),
        max_attendees: req.max_attendees,
        attendees: Vec::new(),
        image_url: req.image_url,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    validate_event(&event, true)?;

    let event = event_repo::insert_event(&state.db, &event).await?;
    tracing::info!("✅ Event created: {} by {}", event.id, user_id);
    Ok(event)
}

/// Applies a patch to an event, organizer only.
///
/// The patch schema carries only mutable fields; identity, ownership, and
/// membership cannot be expressed in it. The merged state is re-validated
/// before persisting, and a newly supplied date must be in the future.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `user_id` - The authenticated user; must be the organizer.
/// * `event_id` - The event to update.
/// * `patch` - The fields to change.
///
/// # Returns
///
/// A `Result` containing the updated `Event`.
pub async fn update_event(
    state: &AppState,
    user_id: Uuid,
    event_id: &Uuid,
    patch: UpdateEventRequest,
) -> Result<Event> {
    let mut event = event_repo::find_by_id(&state.db, event_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if event.organizer != user_id {
        return Err(AppError::Forbidden);
    }

    let date_changed = patch.date.is_some();

    if let Some(title) = patch.title {
        event.title = title.trim().to_string();
    }
    if let Some(description) = patch.description {
        event.description = description;
    }
    if let Some(date) = patch.date {
        event.date = date;
    }
    if let Some(start_time) = patch.start_time {
        event.start_time = start_time;
    }
    if let Some(end_time) = patch.end_time {
        event.end_time = end_time;
    }
    if let Some(location) = patch.location {
        event.location = Location {
            address: location.address.trim().to_string(),
            coordinates: Coordinates {
                lat: location.coordinates.lat,
                lng: location.coordinates.lng,
            },
        };
    }
    if let Some(tags) = patch.tags {
        event.tags = normalize_tags(tags);
    }
    if let Some(max_attendees) = patch.max_attendees {
        event.max_attendees = Some(max_attendees);
    }
    if let Some(image_url) = patch.image_url {
        event.image_url = Some(image_url);
    }
    if let Some(is_active) = patch.is_active {
        event.is_active = is_active;
    }

    validate_event(&event, date_changed)?;

    let event = event_repo::update_event(&state.db, &event).await?;
    tracing::info!("✅ Event updated: {}", event.id);
    Ok(event)
}

/// Hard-deletes an event, organizer only.
pub async fn delete_event(state: &AppState, user_id: Uuid, event_id: &Uuid) -> Result<()> {
    let event = event_repo::find_by_id(&state.db, event_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if event.organizer != user_id {
        return Err(AppError::Forbidden);
    }

    event_repo::delete_event(&state.db, event_id).await?;
    tracing::info!("✅ Event deleted: {} by {}", event_id, user_id);
    Ok(())
}
