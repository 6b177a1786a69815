use secrecy::SecretString;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAILERSEND_BASE_URL: &str = "https://api.mailersend.com/v1";

/// Local dev servers, plus `null` for pages opened from `file://`.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:8080",
    "http://127.0.0.1:8080",
    "null",
];

/// Process-wide settings, resolved once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub common: core_config::Config,
    pub openai: OpenAiConfig,
    pub cors: CorsConfig,
    pub mailersend: MailerSendConfig,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// `None` switches `/generate` to template mode.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MailerSendConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
}

impl ServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Ok(Self::from_lookup(common, |key| env::var(key).ok()))
    }

    /// Resolve every setting through `lookup`, applying defaults.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        ServiceConfig {
            common,
            openai: OpenAiConfig {
                api_key: non_empty("OPENAI_API_KEY").map(SecretString::new),
                model: non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: non_empty("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ORIGIN")
                    .map(|raw| parse_origins(&raw))
                    .unwrap_or_else(default_origins),
            },
            mailersend: MailerSendConfig {
                api_key: non_empty("MAILERSEND_API_KEY").map(SecretString::new),
                base_url: non_empty("MAILERSEND_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_MAILERSEND_BASE_URL.to_string()),
            },
        }
    }
}

fn default_origins() -> Vec<String> {
    DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()
}

/// Split a comma-separated origin list, trimming entries and dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
