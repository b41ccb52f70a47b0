use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// The claims embedded in a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - the user ID.
    pub sub: Uuid,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Issues a signed session token for a user.
///
/// The token is `base64url(claims_json) . base64url(hmac_sha256(secret, claims_json))`.
/// Pure function of the secret and payload; nothing is persisted server-side.
///
/// # Arguments
///
/// * `secret` - The HMAC signing key.
/// * `user_id` - The ID of the user the token asserts.
/// * `ttl_days` - How long the token stays valid.
///
/// # Returns
///
/// A `Result` containing the encoded token.
pub fn issue(secret: &[u8], user_id: Uuid, ttl_days: i64) -> Result<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + chrono::Duration::days(ttl_days)).timestamp(),
    };

    let payload = sonic_rs::to_string(&claims)
        .map_err(|e| AppError::Internal(format!("Claims serialization failed: {}", e)))?;
    let signature = sign(secret, payload.as_bytes())?;

    Ok(format!(
        "{}.{}",
        general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes()),
        general_purpose::URL_SAFE_NO_PAD.encode(signature),
    ))
}

/// Verifies a session token and resolves it to a user ID.
///
/// Fails closed: a malformed structure, undecodable part, signature
/// mismatch, unparseable payload, or elapsed expiry all collapse into the
/// same authentication error so the cause never leaks to the caller.
///
/// # Arguments
///
/// * `secret` - The HMAC signing key.
/// * `token` - The encoded token.
///
/// # Returns
///
/// A `Result` containing the asserted user ID.
pub fn verify(secret: &[u8], token: &str) -> Result<Uuid> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or_else(invalid_token)?;

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| invalid_token())?;
    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| invalid_token())?;

    let expected = sign(secret, &payload)?;
    if expected.ct_eq(&signature).unwrap_u8() != 1 {
        return Err(invalid_token());
    }

    let claims: TokenClaims = sonic_rs::from_slice(&payload).map_err(|_| invalid_token())?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(invalid_token());
    }

    Ok(claims.sub)
}

fn sign(secret: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(format!("Invalid signing key: {}", e)))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn invalid_token() -> AppError {
    AppError::Authentication("Invalid token".to_string())
}
