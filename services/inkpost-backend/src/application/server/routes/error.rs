use axum::extract::Json;
use axum::http::status::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::domain::ports::secondary::{EmailError, PageError, SubscriptionError};
use common::err_context::ErrorContext;

#[derive(Debug, Serialize)]
pub enum Error {
    InvalidRequest {
        context: String,
    },
    Unauthorized {
        context: String,
    },
    Forbidden {
        context: String,
    },
    NotFound {
        context: String,
    },
    RateLimited {
        context: String,
    },
    Data {
        context: String,
        source: SubscriptionError,
    },
    Email {
        context: String,
        source: EmailError,
    },
    Site {
        context: String,
        source: PageError,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRequest { context } => {
                write!(fmt, "Invalid Request: {context}")
            }
            Error::Unauthorized { context } => {
                write!(fmt, "Unauthorized: {context}")
            }
            Error::Forbidden { context } => {
                write!(fmt, "Forbidden: {context}")
            }
            Error::NotFound { context } => {
                write!(fmt, "Not Found: {context}")
            }
            Error::RateLimited { context } => {
                write!(fmt, "Rate Limited: {context}")
            }
            Error::Data { context, source } => {
                write!(fmt, "Data: {context} {source}")
            }
            Error::Email { context, source } => {
                write!(fmt, "Email: {context} {source}")
            }
            Error::Site { context, source } => {
                write!(fmt, "Site: {context} {source}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("{self}");
        self.standardize().into_response()
    }
}

impl From<ErrorContext<SubscriptionError>> for Error {
    fn from(err: ErrorContext<SubscriptionError>) -> Self {
        Error::Data {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<EmailError>> for Error {
    fn from(err: ErrorContext<EmailError>) -> Self {
        Error::Email {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<PageError>> for Error {
    fn from(err: ErrorContext<PageError>) -> Self {
        Error::Site {
            context: err.0,
            source: err.1,
        }
    }
}

impl Error {
    /// Maps the error onto a status code and a JSON body. Upstream
    /// sources stay out of the body, detail belongs in the logs.
    pub fn standardize(&self) -> (StatusCode, Json<Value>) {
        match self {
            Error::InvalidRequest { context } => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "status": "fail",
                    "message": context,
                    "code": "request/invalid"
                })),
            ),
            Error::Unauthorized { context } => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "status": "fail",
                    "message": context,
                    "code": "auth/invalid_secret"
                })),
            ),
            Error::Forbidden { context } => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({
                    "status": "fail",
                    "message": context,
                    "code": "origin/forbidden"
                })),
            ),
            Error::NotFound { context } => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "status": "fail",
                    "message": context,
                    "code": "post/not_found"
                })),
            ),
            Error::RateLimited { context } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "status": "fail",
                    "message": context,
                    "code": "rate/limited"
                })),
            ),
            Error::Data { context, source: _ } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "fail",
                    "message": context,
                    "code": "store/internal_error"
                })),
            ),
            Error::Email { context, source: _ } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "fail",
                    "message": context,
                    "code": "email/internal_error"
                })),
            ),
            Error::Site { context, source: _ } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "fail",
                    "message": context,
                    "code": "site/internal_error"
                })),
            ),
        }
    }
}
