use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::db::services::{TagError, TaskError};
use crate::web::middleware::auth::login_redirect;
use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),
    /// Absent or not visible to the caller; the two cases are never told apart.
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Carries the path to come back to after login.
    #[error("Authentication required for {0}")]
    Unauthenticated(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    PasswordHashingError(String),
    #[error("JWT creation failed: {0}")]
    TokenCreationError(String),
    #[error("Template error: {0}")]
    TemplateError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{message}</p><p><a href=\"/\">Back to tasks</a></p></body></html>"
    );
    (status, Html(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, errors.to_string()).into_response()
            }
            AppError::NotFound(_) => error_page(
                StatusCode::NOT_FOUND,
                "Not Found",
                "The requested page could not be found.",
            ),
            AppError::Unauthenticated(next) => login_redirect(&next),
            AppError::InvalidCredentials => error_page(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Please enter a correct username and password.",
            ),
            other => {
                error!(error = %other, "Request failed.");
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server Error",
                    "Something went wrong on our side.",
                )
            }
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        // Tera nests the useful detail in the source chain.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        AppError::TemplateError(message)
    }
}

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::DbErr(e) => e.into(),
            TaskError::NotFound(_) | TaskError::InvalidPage(_) => {
                AppError::NotFound("No task matches the given query.".to_string())
            }
            TaskError::Validation(errors) => AppError::Validation(errors),
        }
    }
}

impl From<TagError> for AppError {
    fn from(err: TagError) -> Self {
        match err {
            TagError::DbErr(e) => e.into(),
            TagError::NotFound(_) => AppError::NotFound("No tag matches the given query.".to_string()),
            TagError::Validation(errors) => AppError::Validation(errors),
        }
    }
}
