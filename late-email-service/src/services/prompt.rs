//! Prompt text and sampling settings for the chat-completion call.

use crate::models::{present, GenerationRequest};

pub const TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 400;

pub const SYSTEM_PROMPT: &str = "You are an assistant that writes concise, professional emails \
explaining lateness with accountability and solutions. Always avoid implausible excuses. Adapt \
tone to the user's request and ensure it is culturally appropriate for the locale. Respond in \
JSON with {\"subject\": string, \"body\": string}.";

/// Lay out every request field in a fixed order for the model.
pub fn user_prompt(request: &GenerationRequest) -> String {
    let extension = if request.ask_for_extension {
        format!(
            "yes, propose {}",
            present(&request.proposed_new_deadline).unwrap_or("TBD")
        )
    } else {
        "no".to_string()
    };

    format!(
        "Write an email explaining a late arrival/submission. Requirements:\n\
         - Audience: {audience}\n\
         - Sender: {sender}\n\
         - Recipient: {recipient}\n\
         - Context: {context}\n\
         - Reason: {reason}\n\
         - Date/Deadline: {deadline}\n\
         - Tone: {tone}\n\
         - Locale: {locale}\n\
         - Length: {length}\n\
         - Additional details: {details}\n\
         - Ask for extension: {extension}\n\
         \n\
         Constraints:\n\
         - Be sincere and accountable.\n\
         - Offer a brief plan to avoid recurrence.\n\
         - Keep subject line clear.\n\
         - Return ONLY valid JSON with keys subject and body.",
        audience = request.audience,
        sender = request.person_name,
        recipient = request.recipient_name,
        context = request.context,
        reason = request.reason,
        deadline = present(&request.date_or_deadline).unwrap_or("n/a"),
        tone = request.tone,
        locale = request.locale,
        length = request.length,
        details = present(&request.additional_details).unwrap_or("n/a"),
        extension = extension,
    )
}
