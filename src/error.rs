// src/error.rs
// Every failure reaches the client as {"error": <category>, "message": ...}.
// Storage and unexpected failures are logged here and replaced with a generic
// message.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DbError;
use crate::validation::{Loc, ValidationErrors};

const CATEGORY_NAME_CONSTRAINT: &str = "categories_name_key";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request body is required")]
    MissingBody,

    #[error("Invalid JSON: {0}")]
    MalformedBody(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error(transparent)]
    Database(DbError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    fn category(&self) -> &'static str {
        match self {
            ApiError::MissingBody | ApiError::MalformedBody(_) | ApiError::Validation(_) => {
                "Validation error"
            }
            ApiError::NotFound { .. } => "Not found",
            ApiError::Database(_) => "Database error",
            ApiError::Unexpected(_) => "Unexpected error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingBody | ApiError::MalformedBody(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::Database(e) => {
                tracing::error!(error = ?e, "Database error.");
                Value::from("An internal database error occurred")
            }
            ApiError::Unexpected(detail) => {
                tracing::error!(detail = %detail, "Unexpected error.");
                Value::from("An unexpected error occurred")
            }
            other => Value::from(other.to_string()),
        };

        let body = Json(json!({ "error": self.category(), "message": message }));
        (self.status(), body).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        ApiError::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => ApiError::NotFound {
                resource,
                id: id.to_string(),
            },
            DbError::UniqueViolation { constraint } if constraint == CATEGORY_NAME_CONSTRAINT => {
                ApiError::Validation(ValidationErrors::single(
                    vec![Loc::Field("name")],
                    "Category with this name already exists",
                    "unique",
                ))
            }
            other => ApiError::Database(other),
        }
    }
}

/// Failures while booting the service.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
