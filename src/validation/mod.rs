pub mod campaign;
pub mod lead;

use axum::{Json, async_trait, body::Bytes, extract::FromRequest, http::Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::{db::models::api::ErrorDetail, error::AppError};

/// JSON body extractor that runs `validator` rules before the handler sees the value.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S, axum::body::Body> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<axum::body::Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(format!("Invalid JSON body: {}", rejection)))?;
        value.validate().map_err(validation_failed)?;
        Ok(ValidatedJson(value))
    }
}

/// Like `ValidatedJson`, but an absent or blank body yields `T::default()`.
/// A body that is present still has to parse and validate.
pub struct OptionalValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S, axum::body::Body> for OptionalValidatedJson<T>
where
    T: DeserializeOwned + Validate + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<axum::body::Body>, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(format!("Failed to read body: {}", rejection)))?;
        parse_optional_body(&bytes).map(OptionalValidatedJson)
    }
}

pub fn parse_optional_body<T>(bytes: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate + Default,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let value: T = serde_json::from_slice(bytes).map_err(|e| AppError::Validation {
        message: format!("Invalid JSON body: {}", e),
        details: vec![ErrorDetail {
            field: None,
            code: "INVALID_JSON".to_string(),
            message: format!("Invalid JSON body: {}", e),
        }],
    })?;
    value.validate().map_err(validation_failed)?;
    Ok(value)
}

fn validation_failed(errors: ValidationErrors) -> AppError {
    let details: Vec<ErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| ErrorDetail {
                field: Some(field.to_string()),
                code: error.code.to_uppercase(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation failed for field: {}", field)),
            })
        })
        .collect();

    AppError::Validation {
        message: format!("Validation failed with {} errors", details.len()),
        details,
    }
}


/// Shared field rules usable from `#[validate(custom(function = ...))]`.
pub mod rules {
    use validator::ValidationError;

    /// Optional leading `+`, then 7 to 15 digits. Spaces, dashes and parentheses are ignored.
    pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
        let trimmed = phone.trim();
        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if !body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
        {
            return Err(ValidationError::new("invalid_phone_number"));
        }
        let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
        if !(7..=15).contains(&digits) {
            return Err(ValidationError::new("invalid_phone_number"));
        }
        Ok(())
    }

}
