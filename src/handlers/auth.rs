use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies, cookie::time::Duration};

use crate::{
    crypto::token,
    error::{AppError, Result},
    middleware_layer::auth::AuthUser,
    models::user::{PublicUser, Role},
    repositories::user as user_repo,
    services::auth as auth_service,
    state::AppState,
    validation::auth::validate_registration,
};

/// The request payload for user registration.
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// The request payload for user login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The response payload for registration.
#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: PublicUser,
}

/// The response payload for login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

/// The response payload for token verification.
#[derive(Serialize)]
pub struct VerifyResponse {
    pub user: PublicUser,
    pub valid: bool,
}

/// Creates the session cookie carrying a signed token.
///
/// HttpOnly and SameSite=Strict always; Secure in production.
fn session_cookie(value: String, max_age_days: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new("token", value);

    let is_production =
        std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()) == "production";

    cookie.set_http_only(true);
    if is_production {
        cookie.set_secure(true);
    }
    cookie.set_same_site(tower_cookies::cookie::SameSite::Strict);
    cookie.set_max_age(Duration::seconds(max_age_days * 86400));
    cookie.set_path("/");

    cookie
}

/// Clears the session cookie by expiring it immediately.
pub fn clear_session_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::new("token", "");
    cookie.set_http_only(true);
    cookie.set_max_age(Duration::seconds(0));
    cookie.set_path("/");
    cookies.remove(cookie);
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("📝 Register attempt for: {}", payload.email);
    validate_registration(&payload.name, &payload.email, &payload.password)?;

    let user = auth_service::register(
        &state,
        payload.name,
        payload.email,
        payload.password,
        payload.role,
    )
    .await?;

    let response = RegisterResponse {
        message: "User created successfully".to_string(),
        user: PublicUser::from(&user),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login: verifies credentials, issues a signed token, and
/// sets the session cookie.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt for: {}", payload.email);

    let user = auth_service::authenticate(&state, &payload.email, &payload.password).await?;

    let token = token::issue(
        state.config.token_secret.as_ref(),
        user.id,
        state.config.token_ttl_days,
    )?;

    cookies.add(session_cookie(token.clone(), state.config.token_ttl_days));
    tracing::info!("✅ Session cookie set for user: {}", user.id);

    let response = LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: PublicUser::from(&user),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout by clearing the session cookie.
///
/// Tokens are stateless, so there is nothing to revoke server-side.
#[axum::debug_handler]
pub async fn logout(
    Extension(auth): Extension<AuthUser>,
    cookies: Cookies,
) -> Result<Response> {
    tracing::info!("👋 Logout for user: {}", auth.user_id);

    clear_session_cookie(&cookies);

    Ok((StatusCode::OK, r#"{"message":"Logout successful"}"#).into_response())
}

/// Verifies the caller's token and confirms the user still exists.
#[axum::debug_handler]
pub async fn verify(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response> {
    let user = user_repo::find_by_id(&state.db, &auth.user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

    let response = VerifyResponse {
        user: PublicUser::from(&user),
        valid: true,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
