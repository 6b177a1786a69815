use axum::{extract::State, Json};
use serde_json::Value;
use service_core::error::AppError;

use crate::models::{GenerationRequest, GenerationResult};
use crate::services::{parse_model_output, prompt, template, CompletionParams, ParseOutcome};
use crate::startup::AppState;

/// Draft an apology email from the request fields.
///
/// Without a model credential the deterministic template answers. Otherwise
/// one chat completion is requested and its output must hold a
/// `{subject, body}` object.
#[tracing::instrument(skip(state, payload))]
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<GenerationResult>, AppError> {
    let request = GenerationRequest::from_value(&payload)?;

    let Some(provider) = state.chat_provider.as_ref() else {
        tracing::debug!("No model credential configured, rendering template");
        return Ok(Json(template::render(&request)));
    };

    let user_prompt = prompt::user_prompt(&request);
    let raw = provider
        .complete(prompt::SYSTEM_PROMPT, &user_prompt, &CompletionParams::default())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Model call failed");
            AppError::GenerationFailed(anyhow::Error::new(e))
        })?;

    match parse_model_output(&raw) {
        ParseOutcome::Parsed(email) => Ok(Json(GenerationResult {
            subject: email.subject,
            body: email.body,
            model: state.config.openai.model.clone(),
            used_llm: true,
        })),
        ParseOutcome::ParseFailed => {
            tracing::warn!(raw_len = raw.len(), "Model output contained no parseable JSON object");
            Err(AppError::InvalidModelResponse { raw })
        }
        ParseOutcome::ShapeInvalid => {
            tracing::warn!(
                raw_len = raw.len(),
                "Model output lacked string subject and body fields"
            );
            Err(AppError::InvalidModelResponse { raw })
        }
    }
}
