use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    crypto::token,
    error::{AppError, Result},
    state::AppState,
};

/// The authenticated identity attached to a request by [`require_auth`].
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Extracts the raw session token from a request.
///
/// The `Authorization: Bearer` header takes precedence over the `token`
/// cookie when both are present.
pub fn extract_token(headers: &HeaderMap, cookies: &Cookies) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
        .or_else(|| cookies.get("token").map(|cookie| cookie.value().to_string()))
}

/// Resolves a request to an identity, if it carries a valid token.
///
/// Used by endpoints that tolerate anonymous callers: an absent or invalid
/// token resolves to `None` instead of an error.
pub fn resolve_identity(state: &AppState, headers: &HeaderMap, cookies: &Cookies) -> Option<Uuid> {
    let token = extract_token(headers, cookies)?;
    token::verify(state.config.token_secret.as_ref(), &token).ok()
}

/// A middleware that requires a valid session token to be present.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response`, or an authentication error.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_token(request.headers(), &cookies)
        .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))?;

    let user_id = token::verify(state.config.token_secret.as_ref(), &token)?;

    tracing::debug!("✅ User authenticated: {}", user_id);

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
