use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment provider error: {0}")]
    Upstream(String),

    #[error("Payment provider timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl AppError {
    /// Classifies a failed outbound provider call. Timeouts stay distinct from
    /// every other transport failure.
    pub fn from_provider(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamTimeout(format!("{} did not answer in time", provider))
        } else {
            AppError::Upstream(format!("{} request failed: {}", provider, err))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized access".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden access".to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => {
                warn!("payment provider failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::UpstreamTimeout(msg) => {
                warn!("payment provider timeout: {}", msg);
                (StatusCode::GATEWAY_TIMEOUT, msg)
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Migration(e) => {
                error!("migration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Token(e) => {
                error!("token error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to issue token".to_string(),
                )
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
