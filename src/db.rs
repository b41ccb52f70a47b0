use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use crate::error::{AppError, Result};
use std::time::Duration;

/// Creates a new database connection pool.
///
/// # Arguments
///
/// * `database_url` - The URL of the PostgreSQL database.
///
/// # Returns
///
/// A `Result` containing the `Pool`.
pub fn create_pool(database_url: &str) -> Result<Pool> {
    let pg_config: tokio_postgres::Config = database_url.parse()?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(100)
        .wait_timeout(Some(Duration::from_secs(5)))
        .create_timeout(Some(Duration::from_secs(2)))
        .recycle_timeout(Some(Duration::from_secs(1)))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create pool: {}", e)))
}

/// Creates the application tables and indexes if they do not exist.
///
/// The binary is self-contained against an empty database: the schema is
/// applied on startup before the server starts accepting requests.
pub async fn init_schema(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;

    client
        .batch_execute(
            r#"
            DO $$ BEGIN
                CREATE TYPE user_role AS ENUM ('user', 'organizer', 'admin');
            EXCEPTION
                WHEN duplicate_object THEN NULL;
            END $$;

            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role user_role NOT NULL DEFAULT 'user',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );

            CREATE TABLE IF NOT EXISTS events (
                id UUID PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                organizer UUID NOT NULL REFERENCES users(id),
                date TIMESTAMPTZ NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                address TEXT NOT NULL,
                lat DOUBLE PRECISION NOT NULL,
                lng DOUBLE PRECISION NOT NULL,
                tags TEXT[] NOT NULL DEFAULT '{}',
                max_attendees INTEGER,
                attendees UUID[] NOT NULL DEFAULT '{}',
                image_url TEXT,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );

            CREATE INDEX IF NOT EXISTS events_date_idx ON events (date);
            CREATE INDEX IF NOT EXISTS events_organizer_idx ON events (organizer);
            CREATE INDEX IF NOT EXISTS events_tags_idx ON events USING GIN (tags);
            CREATE INDEX IF NOT EXISTS events_attendees_idx ON events USING GIN (attendees);
            "#,
        )
        .await?;

    Ok(())
}
