use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::event::Event;
use crate::models::user::PublicUser;
use crate::repositories::{event as event_repo, user as user_repo};
use crate::state::AppState;

/// Aggregate figures shown on the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_organized: usize,
    pub total_attending: usize,
    pub upcoming_organized: usize,
    pub upcoming_attending: usize,
    pub total_attendees: usize,
}

/// Everything the dashboard view needs in one fetch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user: PublicUser,
    pub organized_events: Vec<Event>,
    pub attending_events: Vec<Event>,
    pub stats: DashboardStats,
}

/// Assembles a user's dashboard: owned events, attended events, and stats.
///
/// Owned events are listed regardless of activity or date; the attending
/// list excludes events the user organizes.
pub async fn dashboard(state: &AppState, user_id: Uuid) -> Result<Dashboard> {
    let user = user_repo::find_by_id(&state.db, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let organized = event_repo::find_by_organizer(&state.db, &user_id).await?;
    let attending = event_repo::find_attending(&state.db, &user_id).await?;

    let now = chrono::Utc::now();
    let stats = DashboardStats {
        total_organized: organized.len(),
        total_attending: attending.len(),
        upcoming_organized: organized.iter().filter(|e| e.date > now).count(),
        upcoming_attending: attending.iter().filter(|e| e.date > now).count(),
        total_attendees: organized.iter().map(|e| e.attendees.len()).sum(),
    };

    Ok(Dashboard {
        user: PublicUser::from(&user),
        organized_events: organized,
        attending_events: attending,
        stats,
    })
}

/// Deletes a user's account and every trace of it.
///
/// The cascade (owned events, attendee memberships, the user row) runs in
/// one database transaction; a partial cascade cannot be observed.
pub async fn delete_account(state: &AppState, user_id: Uuid) -> Result<()> {
    user_repo::find_by_id(&state.db, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    user_repo::delete_account_cascade(&state.db, &user_id).await?;

    tracing::info!("✅ Account deleted: {}", user_id);
    Ok(())
}
