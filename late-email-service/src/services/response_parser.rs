//! Turns raw model output into a `{subject, body}` pair.
//!
//! Parsing is a two-step pipeline: the whole text as JSON first, and only if
//! that fails, the span from the first `{` to the last `}`. The recovery span
//! is greedy, so output carrying several JSON fragments is captured as one
//! span and will usually fail to parse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static JSON_OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON object pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEmail {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A JSON object with string `subject` and `body`.
    Parsed(ModelEmail),
    /// Neither the text nor an embedded object span is valid JSON.
    ParseFailed,
    /// Valid JSON without the expected string fields.
    ShapeInvalid,
}

pub fn parse_model_output(raw: &str) -> ParseOutcome {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => match extract_object_span(raw) {
            Some(value) => value,
            None => return ParseOutcome::ParseFailed,
        },
    };

    match email_from_value(&value) {
        Some(email) => ParseOutcome::Parsed(email),
        None => ParseOutcome::ShapeInvalid,
    }
}

fn extract_object_span(raw: &str) -> Option<Value> {
    let span = JSON_OBJECT_SPAN.find(raw)?;
    serde_json::from_str(span.as_str()).ok()
}

fn email_from_value(value: &Value) -> Option<ModelEmail> {
    let subject = value.get("subject")?.as_str()?;
    let body = value.get("body")?.as_str()?;
    Some(ModelEmail {
        subject: subject.to_string(),
        body: body.to_string(),
    })
}
