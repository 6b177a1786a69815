//! Request and result types for `/generate`.
//!
//! The request is validated from a raw JSON value rather than through a
//! typed `Deserialize` so that every offending field is reported at once,
//! including fields with the wrong JSON type.

use serde::Serialize;
use serde_json::{Map, Value};
use service_core::error::FieldViolations;
use validator::Validate;

/// Model marker reported when the deterministic template produced the email.
pub const TEMPLATE_MODEL: &str = "template";

pub const DEFAULT_AUDIENCE: &str = "instructor";
pub const DEFAULT_CONTEXT: &str = "class";
pub const DEFAULT_REASON: &str = "unexpected circumstances";
pub const DEFAULT_TONE: &str = "professional and apologetic";
pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_LENGTH: &str = "short";

/// A validated request with every default applied.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct GenerationRequest {
    #[validate(length(min = 1, message = "String must contain at least 1 character(s)"))]
    pub person_name: String,
    #[validate(length(min = 1, message = "String must contain at least 1 character(s)"))]
    pub recipient_name: String,
    pub audience: String,
    pub context: String,
    pub reason: String,
    pub date_or_deadline: Option<String>,
    pub tone: String,
    pub additional_details: Option<String>,
    pub ask_for_extension: bool,
    pub proposed_new_deadline: Option<String>,
    pub locale: String,
    pub length: String,
}

impl GenerationRequest {
    /// Validate and normalize an arbitrary JSON body.
    pub fn from_value(value: &Value) -> Result<Self, FieldViolations> {
        let mut violations = FieldViolations::new();

        let Some(object) = value.as_object() else {
            violations.add_form_error(format!("Expected object, received {}", json_type(value)));
            return Err(violations);
        };

        let mut fields = FieldReader {
            object,
            violations: &mut violations,
        };

        let request = GenerationRequest {
            person_name: fields.required_string("personName"),
            recipient_name: fields.required_string("recipientName"),
            audience: fields.string_or("audience", DEFAULT_AUDIENCE),
            context: fields.string_or("context", DEFAULT_CONTEXT),
            reason: fields.string_or("reason", DEFAULT_REASON),
            date_or_deadline: fields.optional_string("dateOrDeadline"),
            tone: fields.string_or("tone", DEFAULT_TONE),
            additional_details: fields.optional_string("additionalDetails"),
            ask_for_extension: fields.bool_or("askForExtension", false),
            proposed_new_deadline: fields.optional_string("proposedNewDeadline"),
            locale: fields.string_or("locale", DEFAULT_LOCALE),
            length: fields.string_or("length", DEFAULT_LENGTH),
        };

        if let Err(errors) = request.validate() {
            violations.merge(rename_fields(errors));
        }

        if violations.is_empty() {
            Ok(request)
        } else {
            Err(violations)
        }
    }
}

/// The derive reports Rust field names; the wire uses camelCase.
fn rename_fields(errors: validator::ValidationErrors) -> validator::ValidationErrors {
    let mut renamed = validator::ValidationErrors::new();
    for (field, field_errors) in errors.field_errors() {
        let wire_name = match field {
            "person_name" => "personName",
            "recipient_name" => "recipientName",
            other => other,
        };
        for error in field_errors.iter() {
            renamed.add(wire_name, error.clone());
        }
    }
    renamed
}

/// Returns the value only when it is present and non-empty.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    violations: &'a mut FieldViolations,
}

impl FieldReader<'_> {
    /// `null` counts as absent.
    fn lookup(&self, field: &str) -> Option<&Value> {
        self.object.get(field).filter(|v| !v.is_null())
    }

    fn invalid_type(&mut self, field: &'static str, expected: &str, actual: &Value) {
        self.violations.add_field(
            field,
            "invalid_type",
            format!("Expected {}, received {}", expected, json_type(actual)),
        );
    }

    fn required_string(&mut self, field: &'static str) -> String {
        match self.lookup(field).cloned() {
            None => {
                self.violations.add_field(field, "required", "Required");
                String::new()
            }
            Some(Value::String(s)) => s,
            Some(other) => {
                self.invalid_type(field, "string", &other);
                String::new()
            }
        }
    }

    fn optional_string(&mut self, field: &'static str) -> Option<String> {
        match self.lookup(field).cloned() {
            None => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                self.invalid_type(field, "string", &other);
                None
            }
        }
    }

    fn string_or(&mut self, field: &'static str, default: &str) -> String {
        self.optional_string(field)
            .unwrap_or_else(|| default.to_string())
    }

    fn bool_or(&mut self, field: &'static str, default: bool) -> bool {
        match self.lookup(field).cloned() {
            None => default,
            Some(Value::Bool(b)) => b,
            Some(other) => {
                self.invalid_type(field, "boolean", &other);
                default
            }
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The email returned to the caller, whichever path produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub subject: String,
    pub body: String,
    pub model: String,
    #[serde(rename = "usedLLM")]
    pub used_llm: bool,
}
