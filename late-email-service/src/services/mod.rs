pub mod mailer;
pub mod prompt;
pub mod providers;
pub mod response_parser;
pub mod template;

pub use mailer::{MailError, MailSender, MailerSendClient, OutgoingEmail};
pub use providers::{
    ChatProvider, CompletionParams, MockChatProvider, OpenAiChatConfig, OpenAiChatProvider,
    ProviderError,
};
pub use response_parser::{parse_model_output, ModelEmail, ParseOutcome};
