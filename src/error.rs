use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use time::{macros::format_description, OffsetDateTime};
use tracing::error;

const DEFAULT_NOT_FOUND_MESSAGE: &str = "User Not Found";
const UNEXPECTED_MESSAGE: &str = "Unexpected error";

/// Every failure a handler can return. Turned into an [`ApiError`] body in one place.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid user id: {0}")]
    InvalidId(String),
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_not_found(id: &str) -> Self {
        Self::NotFound(format!("No user found with id: {}", id))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidId(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg) if msg.trim().is_empty() => DEFAULT_NOT_FOUND_MESSAGE.into(),
            Self::Internal(_) => UNEXPECTED_MESSAGE.into(),
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Error body: `{status, timestamp, message, debugMessage}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub status: u16,
    pub timestamp: String,
    pub message: String,
    pub debug_message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: String, debug_message: String) -> Self {
        Self {
            status: status.as_u16(),
            timestamp: utc_timestamp(),
            message,
            debug_message,
        }
    }
}

fn utc_timestamp() -> String {
    let format = format_description!("[day]-[month]-[year] [hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(format)
        .unwrap_or_default()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }
        let debug_message = match &self {
            Self::Internal(e) => format!("{:#}", e),
            other => other.to_string(),
        };
        let body = ApiError::new(status, self.public_message(), debug_message);
        (status, Json(body)).into_response()
    }
}
