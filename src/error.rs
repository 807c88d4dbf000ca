// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// A request field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Failure of the external generation call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to generation API failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generation API error: {0}")]
    Api(String),
    #[error("generation API returned no text")]
    EmptyResponse,
    #[error("{0}")]
    Other(String),
}

/// Errors produced by the session router.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Handler-level error, mapped to an HTTP response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("upstream generation failed")]
    Upstream(#[source] UpstreamError),
}

impl From<RouterError> for AppError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::Validation(e) => AppError::Validation(e),
            RouterError::Upstream(e) => AppError::Upstream(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Upstream(_) => "UPSTREAM_GENERATION_FAILED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (field, message) = match &self {
            AppError::Validation(e) => (Some(e.field), e.message.clone()),
            // Provider details stay in the logs.
            AppError::Upstream(_) => (None, "The generation service failed to respond".to_string()),
        };
        let body = ErrorBody {
            error: ErrorDetail { code: self.code(), field, message },
        };
        (self.status(), Json(body)).into_response()
    }
}
