//! Deterministic email used when no model credential is configured.

use crate::models::{present, GenerationRequest, GenerationResult, TEMPLATE_MODEL};

pub fn render(request: &GenerationRequest) -> GenerationResult {
    GenerationResult {
        subject: format!("Apologies for being late ({})", request.context),
        body: render_body(request),
        model: TEMPLATE_MODEL.to_string(),
        used_llm: false,
    }
}

fn render_body(request: &GenerationRequest) -> String {
    let late_for = match request.context.as_str() {
        "class" => "to class",
        "conference" => "to the conference",
        _ => "with my submission",
    };

    let mut apology = format!(
        "I hope you are well. I wanted to sincerely apologize for being late {}. This was due to {}.",
        late_for, request.reason
    );
    if let Some(date) = present(&request.date_or_deadline) {
        apology.push_str(&format!(" The relevant date/deadline was {}.", date));
    }

    let extension = match (request.ask_for_extension, present(&request.proposed_new_deadline)) {
        (true, Some(deadline)) => format!(
            "If possible, I would appreciate an extension until {}.",
            deadline
        ),
        _ => String::new(),
    };

    let lines = [
        format!("Dear {},", request.recipient_name),
        String::new(),
        apology,
        String::new(),
        present(&request.additional_details)
            .unwrap_or_default()
            .to_string(),
        extension,
        String::new(),
        "Thank you for your understanding.".to_string(),
        String::new(),
        "Best regards,".to_string(),
        request.person_name.clone(),
    ];

    // Empty entries, separators included, never reach the output.
    lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}
