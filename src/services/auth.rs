use argon2::{
    Argon2, ParamsBuilder,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::error::{AppError, Result};
use crate::models::user::{Role, User};
use crate::repositories::user as user_repo;
use crate::state::AppState;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the hashed password.
fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    tracing::debug!("Password hashed successfully with Argon2");
    Ok(password_hash)
}

/// Verifies a password against a hash.
///
/// # Arguments
///
/// * `password` - The password to verify.
/// * `hash` - The hash to verify against.
///
/// # Returns
///
/// A `Result` containing `true` if the password is valid, `false` otherwise.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let argon2 = Argon2::default();
    let result = argon2.verify_password(&password_bytes, &parsed_hash).is_ok();

    password_bytes.zeroize();
    tracing::debug!("Password verification completed");
    Ok(result)
}

/// Registers a new user.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `name` - The user's full name.
/// * `email` - The user's email address.
/// * `password` - The plaintext password.
/// * `role` - The requested role, defaulting to `user`.
///
/// # Returns
///
/// A `Result` containing the created `User`.
pub async fn register(
    state: &AppState,
    name: String,
    email: String,
    password: String,
    role: Option<Role>,
) -> Result<User> {
    tracing::debug!("🔐 Registering user: {}", email);

    if user_repo::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Validation(vec![
            "User with this email already exists".to_string(),
        ]));
    }

    let hashed_password = hash_password(&password)?;

    let user = user_repo::create_user(
        &state.db,
        Uuid::new_v4(),
        name.trim(),
        &email,
        &hashed_password,
        role.unwrap_or(Role::User),
    )
    .await?;

    tracing::info!("✅ User registered with ID: {}", user.id);
    Ok(user)
}

/// Authenticates a user by email and password.
///
/// The same error is returned for an unknown email and a wrong password.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `email` - The user's email address.
/// * `password` - The plaintext password.
///
/// # Returns
///
/// A `Result` containing the authenticated `User`.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<User> {
    tracing::debug!("🔐 Authenticating user: {}", email);

    let user = user_repo::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    if !verify_password(password, &user.password)? {
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!("✅ User authenticated: {}", user.id);
    Ok(user)
}
