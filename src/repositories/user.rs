use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;
use crate::{
    error::Result,
    models::user::{Role, User},
};

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        role: row.try_get("role")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Creates a new user in the database.
///
/// # Arguments
///
/// * `pool` - The database connection pool.
/// * `id` - The unique identifier for the user.
/// * `name` - The user's full name.
/// * `email` - The user's email address.
/// * `password_hash` - The user's hashed password.
/// * `role` - The user's role.
///
/// # Returns
///
/// A `Result` containing the created `User`.
pub async fn create_user(
    pool: &Pool,
    id: Uuid,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO users (id, name, email, password, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password, role, created_at, updated_at
            "#,
            &[&id, &name, &email, &password_hash, &role],
        )
        .await?;
    row_to_user(&row)
}

/// Finds a user by their email address.
pub async fn find_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, name, email, password, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Finds a user by their ID.
pub async fn find_by_id(pool: &Pool, user_id: &Uuid) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, name, email, password, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
            &[user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Deletes a user account and everything that references it, atomically.
///
/// One transaction: the user's own events go away, the user is pulled out
/// of every remaining attendee list, then the user row itself is deleted.
/// Either the whole cascade commits or none of it does.
///
/// # Arguments
///
/// * `pool` - The database connection pool.
/// * `user_id` - The ID of the user to delete.
///
/// # Returns
///
/// A `Result<()>`.
pub async fn delete_account_cascade(pool: &Pool, user_id: &Uuid) -> Result<()> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let owned = tx
        .execute("DELETE FROM events WHERE organizer = $1", &[user_id])
        .await?;

    let memberships = tx
        .execute(
            r#"
            UPDATE events
            SET attendees = array_remove(attendees, $1), updated_at = NOW()
            WHERE attendees @> ARRAY[$1::uuid]
            "#,
            &[user_id],
        )
        .await?;

    tx.execute("DELETE FROM users WHERE id = $1", &[user_id])
        .await?;

    tx.commit().await?;

    tracing::info!(
        "✅ Account cascade for {}: {} owned events deleted, {} memberships removed",
        user_id,
        owned,
        memberships
    );

    Ok(())
}
