use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::repository::constraints;

/// FieldError
///
/// One entry of a validation failure. `field` is absent when the failure concerns the
/// request as a whole (e.g. a body that is not valid JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// ErrorResponse
///
/// Body of every non-validation error.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// ValidationErrorResponse
///
/// Body of a 400 produced by schema validation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub message: String,
    pub errors: Vec<FieldError>,
}

/// AppError
///
/// The single error type every handler and extractor returns. Each variant owns its
/// HTTP status; the message is what the client sees.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed with {} error(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// Details are logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Validation(errors) => (
                status,
                Json(ValidationErrorResponse {
                    message: "Validation error".to_string(),
                    errors,
                }),
            )
                .into_response(),
            AppError::BadRequest(message)
            | AppError::Unauthorized(message)
            | AppError::NotFound(message) => {
                (status, Json(ErrorResponse { message })).into_response()
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed with an internal error");
                (
                    status,
                    Json(ErrorResponse {
                        message: "Internal server error.".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// RepoError
///
/// Failures surfaced by a `Repository`. Unique-key violations are split out so the
/// HTTP layer can turn them into a domain message instead of a 500.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                return RepoError::UniqueViolation(constraint);
            }
        }
        RepoError::Database(err)
    }
}

/// Maps a unique constraint name to the message shown to the client.
pub fn unique_violation_message(constraint: &str) -> &'static str {
    match constraint {
        constraints::ORGANIZATION_SLUG => "Essa organização já existe",
        constraints::MEMBERSHIP_ORG_USER => {
            "A member with same e-mail already belong to the organization."
        }
        constraints::INVITE_EMAIL_ORG => "Another invite with same e-mail already exists.",
        constraints::PERSON_CPF => "CPF já cadastrado",
        constraints::PERSON_NIS => "NIS já cadastrado",
        constraints::ADDRESS_PERSON => "Endereço já cadastrado.",
        constraints::ENROLLMENT_PERSON_COURSE => "Pessoa já matriculada neste curso.",
        _ => "Registro já cadastrado.",
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::UniqueViolation(constraint) => {
                AppError::BadRequest(unique_violation_message(&constraint).to_string())
            }
            RepoError::Database(db_err) => AppError::Internal(db_err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(vec![FieldError::general(rejection.body_text())])
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(vec![FieldError::general(rejection.body_text())])
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(vec![FieldError::general(rejection.body_text())])
    }
}
