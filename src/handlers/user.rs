use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::{
    error::Result,
    handlers::auth::clear_session_cookie,
    middleware_layer::auth::AuthUser,
    services::account as account_service,
    state::AppState,
};

/// Serves the caller's dashboard: organized events, attended events, stats.
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response> {
    let dashboard = account_service::dashboard(&state, auth.user_id).await?;

    Ok((StatusCode::OK, Json(dashboard)).into_response())
}

/// Deletes the caller's account, cascading through owned events and
/// attendee memberships, then clears the session cookie.
#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    cookies: Cookies,
) -> Result<Response> {
    tracing::info!("🗑️ Account deletion requested by: {}", auth.user_id);

    account_service::delete_account(&state, auth.user_id).await?;

    clear_session_cookie(&cookies);

    Ok((StatusCode::OK, r#"{"message":"Account deleted successfully"}"#).into_response())
}
