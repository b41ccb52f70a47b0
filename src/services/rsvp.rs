use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::repositories::event as event_repo;
use crate::state::AppState;

/// The outcome of an RSVP toggle or status check.
#[derive(Debug, Clone, Copy)]
pub struct RsvpOutcome {
    pub is_attending: bool,
    pub attendee_count: i32,
}

/// Toggles a user's attendance on an event.
///
/// Membership is flipped with single-statement conditional updates, never
/// read-modify-write: the capacity check and the append are one atomic
/// operation, so concurrent toggles cannot overfill an event or produce a
/// duplicate membership. Toggling off never fails on capacity.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `event_id` - The event to toggle attendance on.
/// * `user_id` - The authenticated user.
///
/// # Returns
///
/// A `Result` containing the new membership state and attendee count.
pub async fn toggle(state: &AppState, event_id: &Uuid, user_id: Uuid) -> Result<RsvpOutcome> {
    let event = event_repo::find_by_id(&state.db, event_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if event.attendees.contains(&user_id) {
        let count = event_repo::remove_attendee(&state.db, event_id, &user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!("✅ RSVP removed: {} off {}", user_id, event_id);
        return Ok(RsvpOutcome {
            is_attending: false,
            attendee_count: count,
        });
    }

    if let Some(count) = event_repo::add_attendee(&state.db, event_id, &user_id).await? {
        tracing::info!("✅ RSVP added: {} on {}", user_id, event_id);
        return Ok(RsvpOutcome {
            is_attending: true,
            attendee_count: count,
        });
    }

    // The conditional append matched no row: either the event filled up
    // under us, or a concurrent toggle by the same user already added the
    // membership. Re-read to tell the two apart.
    let event = event_repo::find_by_id(&state.db, event_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if event.attendees.contains(&user_id) {
        return Ok(RsvpOutcome {
            is_attending: true,
            attendee_count: event.attendees.len() as i32,
        });
    }

    Err(AppError::CapacityExceeded)
}

/// Reports a caller's attendance status on an event.
///
/// Anonymous callers always see `is_attending = false` with the true
/// attendee count.
///
/// # Returns
///
/// A `Result` containing the outcome plus the event's capacity, if any.
pub async fn status(
    state: &AppState,
    event_id: &Uuid,
    user_id: Option<Uuid>,
) -> Result<(RsvpOutcome, Option<i32>)> {
    let event = event_repo::find_by_id(&state.db, event_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_attending = match user_id {
        Some(user_id) => event.attendees.contains(&user_id),
        None => false,
    };

    Ok((
        RsvpOutcome {
            is_attending,
            attendee_count: event.attendees.len() as i32,
        },
        event.max_attendees,
    ))
}
