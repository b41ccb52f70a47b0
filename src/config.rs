use std::env;
use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The lifetime of an issued session token in days.
    pub token_ttl_days: i64,
    /// The HMAC key used to sign session tokens.
    pub token_secret: Zeroizing<Vec<u8>>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let mut token_secret_hex = env::var("TOKEN_SECRET")
            .context("TOKEN_SECRET must be set (generate with: openssl rand -hex 32)")?;

        let token_secret_bytes = hex::decode(&token_secret_hex)
            .context("TOKEN_SECRET must be valid hexadecimal")?;

        token_secret_hex.zeroize();

        if token_secret_bytes.len() != 32 {
            anyhow::bail!("TOKEN_SECRET must be exactly 32 bytes (64 hex characters)");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            token_ttl_days: env::var("TOKEN_TTL_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid TOKEN_TTL_DAYS")?,
            token_secret: Zeroizing::new(token_secret_bytes),
        })
    }
}
