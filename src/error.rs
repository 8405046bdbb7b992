use crate::db::models::api::{ApiResponse, ErrorDetail};
use axum::{Json, http::StatusCode, response::IntoResponse};
use diesel::result::DatabaseErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ErrorDetail>,
    },

    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        code: Option<String>,
    },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        field: Option<String>,
        code: Option<String>,
    },

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, response) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("Database error"),
                )
            }
            AppError::Pool(ref e) => {
                tracing::error!("Connection pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("Connection error"),
                )
            }
            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("Cache error"),
                )
            }
            AppError::Jwt(ref e) => {
                tracing::warn!("JWT error: {}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    ApiResponse::<()>::unauthorized("Invalid token"),
                )
            }
            AppError::Csv(ref e) => {
                tracing::error!("CSV error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("Export failed"),
                )
            }
            AppError::Auth { ref message } => (
                StatusCode::UNAUTHORIZED,
                ApiResponse::<()>::unauthorized(message),
            ),
            AppError::Forbidden { ref message } => (
                StatusCode::FORBIDDEN,
                ApiResponse::<()>::forbidden(message),
            ),
            AppError::Validation {
                ref message,
                ref details,
            } => (
                StatusCode::BAD_REQUEST,
                ApiResponse::<()>::validation_error(message, details.clone()),
            ),
            AppError::NotFound { ref resource, .. } => (
                StatusCode::NOT_FOUND,
                ApiResponse::<()>::not_found(&format!("{} not found", resource)),
            ),
            AppError::Conflict {
                ref message,
                ref field,
                ref code,
            } => (
                StatusCode::CONFLICT,
                ApiResponse::<()>::conflict(message, field.clone(), code.as_deref().unwrap_or("")),
            ),
            AppError::Transient(ref message) => {
                tracing::warn!("Transient failure: {}", message);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiResponse::<()>::service_unavailable(message),
                )
            }
            AppError::Config(ref e) => {
                tracing::error!("Configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error("Configuration error"),
                )
            }
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::internal_error(message),
                )
            }
        };

        (status, Json(response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// A validation failure pinned to a single request field.
    pub fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            details: vec![ErrorDetail {
                field: Some(field.to_string()),
                code: code.to_string(),
                message: message.clone(),
            }],
            message,
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            code: None,
        }
    }

    pub fn not_found_with_code(resource: impl Into<String>, code: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            code: Some(code.into()),
        }
    }

    pub fn conflict_with_code(
        message: impl Into<String>,
        field: Option<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            message: message.into(),
            field,
            code: Some(code.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Machine-readable code, as rendered in the `errors[].code` field.
    pub fn code(&self) -> &str {
        match self {
            AppError::Database(_) | AppError::Pool(_) | AppError::Redis(_) => "SYSTEM_ERROR",
            AppError::Csv(_) | AppError::Config(_) | AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Jwt(_) | AppError::Auth { .. } => "UNAUTHORIZED",
            AppError::Forbidden { .. } => "FORBIDDEN",
            AppError::Validation { details, .. } => details
                .first()
                .map(|d| d.code.as_str())
                .unwrap_or("VALIDATION_FAILED"),
            AppError::NotFound { code, .. } => code.as_deref().unwrap_or("NOT_FOUND"),
            AppError::Conflict { code, .. } => code.as_deref().unwrap_or("CONFLICT"),
            AppError::Transient(_) => crate::db::models::api::error_codes::TRANSIENT_CONFLICT,
        }
    }

    /// Human-readable message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Pool(_) | AppError::Redis(_) => {
                "Temporary storage failure".to_string()
            }
            AppError::NotFound { resource, .. } => format!("{} not found", resource),
            AppError::Validation { message, details } => match details.first() {
                Some(detail) if details.len() == 1 => detail.message.clone(),
                _ => message.clone(),
            },
            AppError::Conflict { message, .. } => message.clone(),
            AppError::Auth { message } | AppError::Forbidden { message } => message.clone(),
            AppError::Transient(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Serialization failures and deadlocks abort the whole transaction and are safe to retry.
    pub fn is_serialization_conflict(&self) -> bool {
        match self {
            AppError::Database(diesel::result::Error::DatabaseError(kind, info)) => {
                matches!(kind, DatabaseErrorKind::SerializationFailure)
                    || matches!(kind, DatabaseErrorKind::Unknown)
                        && info.message().contains("deadlock detected")
            }
            _ => false,
        }
    }
}
