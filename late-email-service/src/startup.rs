//! Application startup and lifecycle management.

use crate::config::ServiceConfig;
use crate::handlers::{generate, health_check, send_email};
use crate::services::{
    ChatProvider, MailSender, MailerSendClient, OpenAiChatConfig, OpenAiChatProvider,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    /// Present exactly when a model credential is configured.
    pub chat_provider: Option<Arc<dyn ChatProvider>>,
    pub mailer: Option<Arc<dyn MailSender>>,
}

impl AppState {
    /// Wire the outbound clients the configuration asks for.
    pub fn from_config(config: ServiceConfig) -> Result<Self, AppError> {
        let chat_provider: Option<Arc<dyn ChatProvider>> = match &config.openai.api_key {
            Some(api_key) => {
                let provider = OpenAiChatProvider::new(OpenAiChatConfig {
                    api_key: api_key.clone(),
                    model: config.openai.model.clone(),
                    base_url: config.openai.base_url.clone(),
                })
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

                tracing::info!(model = %provider.model(), "Initialized OpenAI chat provider");
                let provider: Arc<dyn ChatProvider> = Arc::new(provider);
                Some(provider)
            }
            None => {
                tracing::warn!(
                    "OPENAI_API_KEY not set. /generate will return a template instead of model output."
                );
                None
            }
        };

        let mailer: Option<Arc<dyn MailSender>> = match &config.mailersend.api_key {
            Some(api_key) => {
                let client =
                    MailerSendClient::new(api_key.clone(), config.mailersend.base_url.clone())
                        .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
                tracing::info!("Initialized MailerSend client");
                let client: Arc<dyn MailSender> = Arc::new(client);
                Some(client)
            }
            None => {
                tracing::info!("MAILERSEND_API_KEY not set, /send is disabled");
                None
            }
        };

        Ok(Self {
            config: Arc::new(config),
            chat_provider,
            mailer,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .route("/send", post(send_email))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(cors)
}

/// Cross-origin policy: listed origins only, never with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(false)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ServiceConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config)?;
        Self::with_state(state).await
    }

    /// Bind a listener for an already-wired state (port 0 = random port for testing).
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
