use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{models::MessageResponse, repository::RepoError};

/// ApiError
///
/// Every handler failure funnels through this type. It renders as
/// `{"message": "..."}` with the matching HTTP status, so clients always get
/// a readable reason alongside the code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("the database did not respond in time")]
    Timeout,
    #[error("{0}")]
    Internal(String),
    /// An extractor refused the request before the handler ran. Keeps the
    /// status axum chose (400, 415, 422, ...).
    #[error("{1}")]
    Rejected(StatusCode, String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected(status, _) => *status,
        }
    }

    /// Maps `RepoError::NotFound` to a 404 naming the missing resource and
    /// everything else through the default conversion.
    pub fn missing(what: &'static str) -> impl FnOnce(RepoError) -> ApiError {
        move |err| match err {
            RepoError::NotFound => ApiError::NotFound(format!("{what} not found")),
            other => other.into(),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => ApiError::NotFound("resource not found".to_string()),
            RepoError::Conflict(message) => ApiError::Conflict(message),
            RepoError::InvalidReference(message) => ApiError::BadRequest(message),
            RepoError::LastAdmin => {
                ApiError::BadRequest("at least one admin must remain".to_string())
            }
            RepoError::Timeout => ApiError::Timeout,
            RepoError::Database(e) => {
                // Driver detail stays in the logs.
                tracing::error!("database error: {:?}", e);
                ApiError::Internal("internal server error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, "request failed: {}", self);
        }
        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}
