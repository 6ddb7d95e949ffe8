//! Unified error type shared by the API handlers and the audit projector.

use thiserror::Error;

/// Inventory error type
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Missing or invalid input (400)
    #[error("{0}")]
    Validation(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Data-access failure, surfaced with the raw store message (500)
    #[error("{0}")]
    Database(#[from] sea_orm::DbErr),

    /// Serialization failure (500)
    #[error("{0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else (500)
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl InventoryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// 4xx errors
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }

    #[cfg(feature = "server")]
    pub fn axum_status_code(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::from_u16(self.http_status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(feature = "server")]
mod axum_impl {
    use super::*;
    use axum::{
        Json,
        extract::rejection::JsonRejection,
        response::{IntoResponse, Response},
    };
    use serde_json::json;

    /// Malformed bodies, wrong field types and a missing JSON content type are
    /// all client input errors.
    impl From<JsonRejection> for InventoryError {
        fn from(rejection: JsonRejection) -> Self {
            Self::Validation(rejection.body_text())
        }
    }

    impl IntoResponse for InventoryError {
        fn into_response(self) -> Response {
            let status = self.axum_status_code();

            match &self {
                InventoryError::Validation(msg) => {
                    tracing::info!(
                        status = status.as_u16(),
                        validation_error = %msg,
                        "Request validation failed"
                    );
                }
                InventoryError::NotFound(resource) => {
                    tracing::info!(
                        status = status.as_u16(),
                        resource = %resource,
                        "Resource not found"
                    );
                }
                InventoryError::Database(db_err) => {
                    tracing::error!(
                        status = status.as_u16(),
                        error = %db_err,
                        "Database operation failed"
                    );
                }
                InventoryError::Serialization(json_err) => {
                    tracing::error!(
                        status = status.as_u16(),
                        serialization_error = %json_err,
                        "JSON serialization failed"
                    );
                }
                InventoryError::Internal(internal_err) => {
                    tracing::error!(
                        status = status.as_u16(),
                        internal_error = ?internal_err,
                        "Internal server error"
                    );
                }
            }

            let body = Json(json!({"error": self.to_string()}));
            (status, body).into_response()
        }
    }
}

impl<T> From<sea_orm::TransactionError<T>> for InventoryError
where
    T: Into<InventoryError>,
{
    fn from(err: sea_orm::TransactionError<T>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db) => Self::Database(db),
            sea_orm::TransactionError::Transaction(app) => app.into(),
        }
    }
}
