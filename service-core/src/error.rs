use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

/// Every validation failure found in a request body.
///
/// Field-level failures are kept as `validator` errors so derive-based rules
/// and hand-written checks end up in one place. Form-level failures (the body
/// is not an object at all) are kept separately.
#[derive(Debug, Default, Clone)]
pub struct FieldViolations {
    form_errors: Vec<String>,
    fields: ValidationErrors,
}

/// Wire shape of [`FieldViolations`]: `{formErrors: [..], fieldErrors: {field: [..]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedViolations {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl FieldViolations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_form_error(&mut self, message: impl Into<String>) {
        self.form_errors.push(message.into());
    }

    pub fn add_field(
        &mut self,
        field: &'static str,
        code: &'static str,
        message: impl Into<Cow<'static, str>>,
    ) {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());
        self.fields.add(field, error);
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.field_errors().contains_key(field)
    }

    /// Fold derive-based results in, skipping fields that already failed an
    /// earlier check so a field never reports two contradictory messages.
    pub fn merge(&mut self, errors: ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            if self.has_field(field) {
                continue;
            }
            for error in field_errors.iter() {
                self.fields.add(field, error.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.fields.is_empty()
    }

    pub fn flatten(&self) -> FlattenedViolations {
        let field_errors = self
            .fields
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        FlattenedViolations {
            form_errors: self.form_errors.clone(),
            field_errors,
        }
    }
}

impl From<ValidationErrors> for FieldViolations {
    fn from(errors: ValidationErrors) -> Self {
        Self {
            form_errors: Vec::new(),
            fields: errors,
        }
    }
}

impl fmt::Display for FieldViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flat = self.flatten();
        let mut parts: Vec<String> = flat.form_errors;
        for (field, messages) in flat.field_errors {
            parts.push(format!("{}: {}", field, messages.join(", ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldViolations {}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] FieldViolations),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Generation failed: {0}")]
    GenerationFailed(anyhow::Error),

    #[error("Invalid model response")]
    InvalidModelResponse { raw: String },

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::ValidationError(FieldViolations::from(err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<FlattenedViolations>,
            #[serde(skip_serializing_if = "Option::is_none")]
            raw: Option<String>,
        }

        let (status, error_message, details, raw) = match self {
            AppError::ValidationError(violations) => (
                StatusCode::BAD_REQUEST,
                "Invalid request".to_string(),
                Some(violations.flatten()),
                None,
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None, None),
            // The upstream cause stays in the logs, never in the response.
            AppError::GenerationFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Generation failed".to_string(),
                None,
                None,
            ),
            AppError::InvalidModelResponse { raw } => (
                StatusCode::BAD_GATEWAY,
                "Invalid model response".to_string(),
                None,
                Some(raw),
            ),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg, None, None),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
                None,
            ),
            AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                None,
                None,
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
                raw,
            }),
        )
            .into_response()
    }
}
