use serde::Serialize;

// Unified API response envelope
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
    pub timestamp: String,
}

#[derive(Serialize, Default)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub code: String,
    pub message: String,
}

/// Flat `{success, message, ...body}` shape returned by the mutating engine actions.
#[derive(Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub body: T,
    pub timestamp: String,
}

impl<T> ActionResponse<T> {
    pub fn new(success: bool, message: impl Into<String>, body: T) -> Self {
        Self {
            success,
            message: message.into(),
            body,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: &str) -> Self {
        Self {
            success: true,
            code: 200,
            message: message.to_string(),
            data: Some(data),
            meta: None,
            errors: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn success_with_meta(data: T, message: &str, meta: ResponseMeta) -> Self {
        Self {
            success: true,
            code: 200,
            message: message.to_string(),
            data: Some(data),
            meta: Some(meta),
            errors: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(code: u16, message: &str, errors: Vec<ErrorDetail>) -> Self {
        Self {
            success: false,
            code,
            message: message.to_string(),
            data: None,
            meta: None,
            errors: Some(errors),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn single_error(code: u16, error_code: &str, message: &str, field: Option<String>) -> Self {
        Self::error(
            code,
            message,
            vec![ErrorDetail {
                field,
                code: error_code.to_string(),
                message: message.to_string(),
            }],
        )
    }

    pub fn validation_error(message: &str, errors: Vec<ErrorDetail>) -> Self {
        Self::error(400, message, errors)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::single_error(401, "UNAUTHORIZED", message, None)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::single_error(403, "FORBIDDEN", message, None)
    }

    pub fn not_found(message: &str) -> Self {
        Self::single_error(404, "NOT_FOUND", message, None)
    }

    pub fn conflict(message: &str, field: Option<String>, error_code: &str) -> Self {
        Self::single_error(409, error_code, message, field)
    }

    pub fn service_unavailable(message: &str) -> Self {
        Self::single_error(503, error_codes::TRANSIENT_CONFLICT, message, None)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::single_error(500, "INTERNAL_ERROR", message, None)
    }
}

// Business error codes
pub mod error_codes {
    pub const CAMPAIGN_NOT_FOUND: &str = "CAMPAIGN_NOT_FOUND";
    pub const CAMPAIGN_NOT_ACTIVE: &str = "CAMPAIGN_NOT_ACTIVE";
    pub const INVALID_STATUS_TRANSITION: &str = "INVALID_STATUS_TRANSITION";
    pub const NO_ELIGIBLE_ASSIGNEES: &str = "NO_ELIGIBLE_ASSIGNEES";
    pub const ASSIGNMENT_NOT_FOUND: &str = "ASSIGNMENT_NOT_FOUND";

    pub const LEAD_NOT_FOUND: &str = "LEAD_NOT_FOUND";
    pub const LEAD_NOT_CLOSED: &str = "LEAD_NOT_CLOSED";
    pub const LEAD_NOT_APPROVED: &str = "LEAD_NOT_APPROVED";
    pub const LEAD_NUMBER_EXHAUSTED: &str = "LEAD_NUMBER_EXHAUSTED";

    pub const TRANSIENT_CONFLICT: &str = "TRANSIENT_CONFLICT";
}
