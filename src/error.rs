use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// An authentication error.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An authorization error.
    #[error("Authorization failed")]
    Forbidden,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A validation error enumerating every violated field.
    #[error("Validation error")]
    Validation(Vec<String>),

    /// An RSVP attempted against a full event.
    #[error("Event has reached maximum capacity")]
    CapacityExceeded,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message, details) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Database error".to_string(), None)
            }

            AppError::Pool(ref e) => {
                tracing::error!("Connection pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Database error".to_string(), None)
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, "unauthenticated", msg.clone(), None)
            }

            AppError::Forbidden => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, "forbidden", "Forbidden".to_string(), None)
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "not_found", "Resource not found".to_string(), None)
            }

            AppError::Validation(errors) => {
                tracing::debug!("Validation error: {:?}", errors);
                (StatusCode::BAD_REQUEST, "validation", "Validation error".to_string(), Some(errors))
            }

            AppError::CapacityExceeded => {
                tracing::debug!("RSVP rejected: event at maximum capacity");
                (
                    StatusCode::BAD_REQUEST,
                    "capacity_exceeded",
                    "Event has reached maximum capacity".to_string(),
                    None,
                )
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal server error".to_string(), None)
            }
        };

        #[derive(serde::Serialize)]
        struct ErrorBody<'a> {
            kind: &'a str,
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<Vec<String>>,
        }

        let body = sonic_rs::to_string(&ErrorBody {
            kind,
            error: message,
            details,
        })
        .unwrap_or_else(|_| r#"{"kind":"internal","error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
