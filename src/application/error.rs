use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{application::feed::FeedError, infra::error::InfraError};

/// Structured error detail attached to a response for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        match &error {
            FeedError::NotFound { entity } => HttpError::new(
                "application::error::feed_error_to_http_error",
                StatusCode::NOT_FOUND,
                "Resource not found",
                format!("`{entity}` lookup failed"),
            ),
            FeedError::Validation(message) => HttpError::new(
                "application::error::feed_error_to_http_error",
                StatusCode::BAD_REQUEST,
                "Request could not be processed",
                message.clone(),
            ),
            FeedError::Forbidden => HttpError::new(
                "application::error::feed_error_to_http_error",
                StatusCode::FORBIDDEN,
                "Forbidden",
                "only the author may edit a post",
            ),
            FeedError::SelfFollow => HttpError::new(
                "application::error::feed_error_to_http_error",
                StatusCode::BAD_REQUEST,
                "Request could not be processed",
                "self-follow is not allowed",
            ),
            FeedError::Repo(crate::application::repos::RepoError::Duplicate { constraint }) => {
                HttpError::new(
                    "application::error::feed_error_to_http_error",
                    StatusCode::CONFLICT,
                    "Duplicate record",
                    constraint.clone(),
                )
            }
            FeedError::Repo(err) => HttpError::from_error(
                "application::error::feed_error_to_http_error",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                err,
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
