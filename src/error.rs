use crate::database::DbError;
use crate::validation::FieldError;
use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("Missing or invalid bearer token.")]
    Unauthorized,
    #[error("Not allowed to act on behalf of {0}.")]
    Forbidden(String),
    #[error("{0} already exists.")]
    Conflict(String),
    #[error("{0} not found.")]
    NotFound(&'static str),
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal",
        }
    }
}

/// Logs the real cause and hands the client a generic message.
pub fn log_error<E: std::fmt::Debug>(err: E, message: &'static str) -> ApiError {
    error!("{}: {:?}", message, err);
    ApiError::Internal(message)
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidCredentials | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => json!({ "error": self.kind(), "errors": errors }),
            _ => json!({ "error": self.kind(), "message": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UsernameTaken(username) => ApiError::Conflict(username),
            DbError::NotOwner(username) => ApiError::Forbidden(username),
            err => log_error(err, "Database error"),
        }
    }
}

impl From<BlockingError> for ApiError {
    fn from(err: BlockingError) -> Self {
        log_error(err, "Worker pool error")
    }
}
