use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No form data received.")]
    EmptyBody,
    #[error("{0}")]
    BadRequest(String),
    #[error("Field '{field}' exceeds the {limit} byte limit")]
    PayloadTooLarge { field: String, limit: usize },
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Failed to save information to the database. Details: {0}")]
    DatabaseError(String),
    #[error("Storage Error: {0}")]
    StorageError(String),
    #[error("AWS Error: {0}")]
    AWSError(String),
    #[error("Configuration Error: {0}")]
    ConfigError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmptyBody | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_)
            | AppError::StorageError(_)
            | AppError::AWSError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            success: false,
            error: self.to_string(),
        })
    }
}
