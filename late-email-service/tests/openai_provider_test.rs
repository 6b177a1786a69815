//! OpenAI client against a local stand-in for the chat completions API.

mod common;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use common::{post_json, valid_request};
use late_email_service::config::ServiceConfig;
use late_email_service::services::{
    ChatProvider, CompletionParams, OpenAiChatConfig, OpenAiChatProvider, ProviderError,
};
use late_email_service::{build_router, AppState};
use secrecy::SecretString;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone)]
struct Upstream {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn chat_completions(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    upstream.seen.lock().unwrap().push((auth, body));
    (upstream.status, Json(upstream.reply.clone()))
}

/// Serve a fake `/v1/chat/completions` and return its base URL.
async fn spawn_upstream(status: StatusCode, reply: Value) -> (String, Upstream) {
    let upstream = Upstream {
        status,
        reply,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let router = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(upstream.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    (format!("http://127.0.0.1:{}/v1", port), upstream)
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn provider(base_url: String) -> OpenAiChatProvider {
    OpenAiChatProvider::new(OpenAiChatConfig {
        api_key: SecretString::new("sk-test".to_string()),
        model: "gpt-4o-mini".to_string(),
        base_url,
    })
    .unwrap()
}

#[tokio::test]
async fn sends_bearer_token_and_json_mode_request() {
    let (base_url, upstream) = spawn_upstream(StatusCode::OK, completion("hello")).await;

    let raw = provider(base_url)
        .complete("system text", "user text", &CompletionParams::default())
        .await
        .unwrap();

    assert_eq!(raw, "hello");

    let seen = upstream.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["response_format"], json!({ "type": "json_object" }));
    assert_eq!(body["temperature"], json!(0.7));
    assert_eq!(body["max_tokens"], 400);
    assert_eq!(
        body["messages"],
        json!([
            { "role": "system", "content": "system text" },
            { "role": "user", "content": "user text" }
        ])
    );
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let (base_url, _) = spawn_upstream(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "bad key" } }),
    )
    .await;

    let err = provider(base_url)
        .complete("s", "u", &CompletionParams::default())
        .await
        .unwrap_err();

    match err {
        ProviderError::Api { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn too_many_requests_is_rate_limited() {
    let (base_url, _) = spawn_upstream(StatusCode::TOO_MANY_REQUESTS, json!({})).await;

    let err = provider(base_url)
        .complete("s", "u", &CompletionParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::RateLimited));
}

#[tokio::test]
async fn unreachable_upstream_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = provider(format!("http://127.0.0.1:{}/v1", port))
        .complete("s", "u", &CompletionParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Network(_)));
}

fn configured_state(base_url: &str) -> AppState {
    let vars = [
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("OPENAI_BASE_URL", base_url.to_string()),
        ("OPENAI_MODEL", "gpt-4o-mini-2024-07-18".to_string()),
    ];
    let config = ServiceConfig::from_lookup(CoreConfig { port: 0 }, |key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    });
    AppState::from_config(config).unwrap()
}

#[tokio::test]
async fn generate_uses_configured_model_end_to_end() {
    let (base_url, upstream) = spawn_upstream(
        StatusCode::OK,
        completion(r#"{"subject":"Sorry I was late","body":"Dear Professor Babbage, ..."}"#),
    )
    .await;
    let router = build_router(configured_state(&base_url));

    let (status, body) = post_json(&router, "/generate", &valid_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "subject": "Sorry I was late",
            "body": "Dear Professor Babbage, ...",
            "model": "gpt-4o-mini-2024-07-18",
            "usedLLM": true
        })
    );

    let seen = upstream.seen.lock().unwrap();
    let user_prompt = seen[0].1["messages"][1]["content"].as_str().unwrap();
    assert!(user_prompt.contains("- Sender: Ada Lovelace\n"));
}

#[tokio::test]
async fn upstream_rejection_surfaces_as_generation_failed() {
    let (base_url, _) = spawn_upstream(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "Incorrect API key provided" } }),
    )
    .await;
    let router = build_router(configured_state(&base_url));

    let (status, body) = post_json(&router, "/generate", &valid_request()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Generation failed" }));
}
