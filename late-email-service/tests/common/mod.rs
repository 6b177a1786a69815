#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use late_email_service::config::ServiceConfig;
use late_email_service::services::{ChatProvider, MailError, MailSender, OutgoingEmail};
use late_email_service::{build_router, AppState, Application};
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const TEST_MODEL: &str = "gpt-4o-mini";

/// Defaults only, random port, no credentials.
pub fn test_config() -> ServiceConfig {
    ServiceConfig::from_lookup(CoreConfig { port: 0 }, |_| None)
}

pub fn state_with(
    chat_provider: Option<Arc<dyn ChatProvider>>,
    mailer: Option<Arc<dyn MailSender>>,
) -> AppState {
    AppState {
        config: Arc::new(test_config()),
        chat_provider,
        mailer,
    }
}

pub fn template_router() -> Router {
    build_router(state_with(None, None))
}

pub fn model_router(provider: Arc<dyn ChatProvider>) -> Router {
    build_router(state_with(Some(provider), None))
}

pub fn mail_router(mailer: Option<Arc<dyn MailSender>>) -> Router {
    build_router(state_with(None, mailer))
}

pub fn valid_request() -> Value {
    json!({
        "personName": "Ada Lovelace",
        "recipientName": "Professor Babbage"
    })
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub async fn post_raw(
    router: &Router,
    path: &str,
    content_type: Option<&str>,
    body: impl Into<Body>,
) -> Response<Body> {
    let mut builder = Request::builder().method("POST").uri(path);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    send(router, builder.body(body.into()).unwrap()).await
}

pub async fn post_json(router: &Router, path: &str, body: &Value) -> (StatusCode, Value) {
    let response = post_raw(router, path, Some("application/json"), body.to_string()).await;
    let status = response.status();
    (status, read_json(response).await)
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body is readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Records every email instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub reject_with: Option<u16>,
}

impl RecordingMailer {
    pub fn rejecting(status: u16) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject_with: Some(status),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if let Some(status) = self.reject_with {
            return Err(MailError::Rejected {
                status,
                body: "rejected by test".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Serve `state` on a random port and wait until `/health` answers.
    pub async fn spawn(state: AppState) -> Self {
        let app = Application::with_state(state)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
