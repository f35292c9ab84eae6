use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::Booking;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("booking overlaps {} existing booking(s)", .0.len())]
    Conflicts(Vec<Booking>),

    #[error("booking created, payment not recorded: {reason}")]
    PaymentNotRecorded { booking_id: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::Conflicts(_) => StatusCode::CONFLICT,
            AppError::PaymentNotRecorded { .. } => StatusCode::MULTI_STATUS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps a uniqueness violation reported by the store to a message a user can act on.
fn duplicate_message(message: &str) -> Option<&'static str> {
    if !message.contains("UNIQUE constraint failed") {
        return None;
    }
    if message.contains("clients.email") {
        Some("a client with this email already exists")
    } else if message.contains("clients.phone") {
        Some("a client with this phone number already exists")
    } else if message.contains("packages.name") {
        Some("a package with this name already exists")
    } else {
        Some("a record with these details already exists")
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<rusqlite::Error>() {
            Ok(db_err) => {
                if let rusqlite::Error::SqliteFailure(_, Some(message)) = &db_err {
                    if let Some(friendly) = duplicate_message(message) {
                        return AppError::Duplicate(friendly.to_string());
                    }
                    if message.contains("FOREIGN KEY constraint failed") {
                        return AppError::Validation(
                            "record is still referenced by other records".to_string(),
                        );
                    }
                }
                AppError::Database(db_err)
            }
            Err(other) => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match &self {
            AppError::Conflicts(conflicts) => serde_json::json!({
                "error": self.to_string(),
                "conflicts": conflicts,
            }),
            AppError::PaymentNotRecorded { booking_id, .. } => serde_json::json!({
                "error": self.to_string(),
                "booking_id": booking_id,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
