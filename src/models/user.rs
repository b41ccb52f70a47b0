use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's role, kept as a capability tag.
///
/// Lifecycle authorization is organizer-equals-owner; the role is stored
/// but not consulted beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[postgres(name = "user")]
    User,
    #[postgres(name = "organizer")]
    Organizer,
    #[postgres(name = "admin")]
    Admin,
}

/// Represents a user in the system.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's full name.
    pub name: String,
    /// The user's email address.
    pub email: String,
    /// The user's hashed password.
    pub password: String,
    /// The user's role.
    pub role: Role,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The outward-facing projection of a user.
///
/// The password hash is not representable here, so it can never leak into a
/// response body.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}
