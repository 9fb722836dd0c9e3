//! Custom error types for the goal service

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors raised by the goal store and status engine
#[derive(Error, Debug)]
pub enum GoalError {
    /// Registration with a username that is already taken
    #[error("Username already exists")]
    DuplicateUsername,

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Deadline that does not parse as `YYYY-MM-DD HH:MM`
    #[error("Invalid deadline format: {0}")]
    InvalidDeadlineFormat(String),

    /// The goal does not exist or belongs to someone else
    #[error("Invalid goal ID or unauthorized access")]
    NotFoundOrUnauthorized,

    /// Rejected user input
    #[error("{0}")]
    Validation(String),

    /// A stored row that does not fit the model
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Password hashing failed
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Type alias for goal store results
pub type GoalResult<T> = Result<T, GoalError>;

/// Failures a request handler cannot turn into a notice
#[derive(Error, Debug)]
pub enum WebError {
    /// Store failure outside the user-facing error kinds
    #[error("Store error: {0}")]
    Store(#[from] GoalError),

    /// Template rendering failed
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Session token could not be signed
    #[error("Session error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Internal server error</h1>"),
        )
            .into_response()
    }
}

/// Type alias for handler results
pub type WebResult<T> = Result<T, WebError>;
