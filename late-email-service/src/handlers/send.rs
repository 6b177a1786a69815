use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use crate::services::{MailError, OutgoingEmail};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[validate(email(message = "Invalid email address"))]
    pub from_email: String,
    #[validate(length(min = 1, message = "Sender name cannot be empty"))]
    pub from_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub to_email: String,
    pub to_name: Option<String>,
    #[validate(length(min = 1, message = "Subject cannot be empty"))]
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

/// Client-facing message when MailerSend could not be reached.
pub const DELIVERY_FAILED: &str = "Email delivery failed";

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub ok: bool,
}

impl From<SendEmailRequest> for OutgoingEmail {
    fn from(request: SendEmailRequest) -> Self {
        OutgoingEmail {
            from_email: request.from_email,
            from_name: request.from_name,
            to_email: request.to_email,
            to_name: request.to_name,
            subject: request.subject,
            body_text: request.body_text,
            body_html: request.body_html,
        }
    }
}

/// Deliver a drafted email through MailerSend.
#[tracing::instrument(skip(state, request))]
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, AppError> {
    request.validate()?;

    let Some(mailer) = state.mailer.as_ref() else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "MAILERSEND_API_KEY is not set"
        )));
    };

    let email = OutgoingEmail::from(request);
    mailer.send(&email).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to send email");
        match e {
            MailError::Rejected { .. } => AppError::BadGateway(e.to_string()),
            MailError::Configuration(_) | MailError::Connection(_) => {
                AppError::BadGateway(DELIVERY_FAILED.to_string())
            }
        }
    })?;

    Ok(Json(SendEmailResponse { ok: true }))
}
