use std::sync::Arc;

use serde_json::json;
use trustgate_core::{ModelClient, TrustgateError};
use trustgate_models::{FakeBackend, OpenAiCompatClient, OpenAiCompatConfig, ProviderResponse};

fn setup(backend: Arc<FakeBackend>) -> OpenAiCompatClient {
    let config = OpenAiCompatConfig::new("test-key", "gpt-4o-mini")
        .with_max_tokens(64)
        .with_temperature(0.0);
    OpenAiCompatClient::new(config, backend)
}

#[tokio::test]
async fn complete_parses_text_usage_and_model() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 200,
        body: json!({
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "message": {"role": "assistant", "content": "7.5"}
            }],
            "usage": {
                "prompt_tokens": 120,
                "completion_tokens": 3,
                "total_tokens": 123
            }
        }),
    });

    let client = setup(backend.clone());
    let resp = client.complete("Score this resume").await.unwrap();

    assert_eq!(resp.text, "7.5");
    assert_eq!(resp.model(), Some("gpt-4o-mini-2024-07-18"));
    let usage = resp.usage.unwrap();
    assert_eq!(usage.input_tokens, 120);
    assert_eq!(usage.output_tokens, 3);
    assert_eq!(usage.total_tokens, 123);
    assert!(resp.latency_ms.is_some());
}

#[tokio::test]
async fn request_sends_prompt_as_single_user_message() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 200,
        body: json!({"choices": [{"message": {"content": "ok"}}], "usage": null}),
    });

    let client = setup(backend.clone());
    let resp = client.complete("hello").await.unwrap();
    assert!(resp.usage.is_none());
    assert_eq!(resp.model(), Some("gpt-4o-mini"));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.url, "https://api.openai.com/v1/chat/completions");
    assert_eq!(req.body["model"], json!("gpt-4o-mini"));
    assert_eq!(req.body["max_tokens"], json!(64));
    assert_eq!(
        req.body["messages"],
        json!([{"role": "user", "content": "hello"}])
    );
    assert!(req
        .headers
        .iter()
        .any(|(k, v)| k == "Authorization" && v == "Bearer test-key"));
}

#[tokio::test]
async fn system_prompt_precedes_user_message() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 200,
        body: json!({"choices": [{"message": {"content": "ok"}}]}),
    });

    let config = OpenAiCompatConfig::new("k", "m")
        .with_base_url("http://localhost:8000/v1/")
        .with_system_prompt("You are a strict grader.");
    let client = OpenAiCompatClient::new(config, backend.clone());
    client.complete("grade").await.unwrap();

    let req = &backend.requests()[0];
    assert_eq!(req.url, "http://localhost:8000/v1/chat/completions");
    assert_eq!(req.body["messages"][0]["role"], json!("system"));
    assert_eq!(req.body["messages"][1]["content"], json!("grade"));
}

#[tokio::test]
async fn rate_limit_status_maps_to_rate_limit_error() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 429,
        body: json!({"error": {"message": "slow down"}}),
    });

    let err = setup(backend).complete("x").await.unwrap_err();
    assert!(matches!(err, TrustgateError::RateLimit(msg) if msg == "slow down"));
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 500,
        body: json!({"error": {"message": "boom"}}),
    });
    backend.push_response(ProviderResponse {
        status: 200,
        body: json!({"choices": [{"message": {"content": "never seen"}}]}),
    });

    let err = setup(backend.clone()).complete("x").await.unwrap_err();
    assert!(matches!(err, TrustgateError::Model(_)));
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn backend_error_propagates() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_error(TrustgateError::Model("connection refused".into()));

    let err = setup(backend).complete("x").await.unwrap_err();
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn missing_content_is_a_parse_error() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 200,
        body: json!({"choices": []}),
    });

    let err = setup(backend).complete("x").await.unwrap_err();
    assert!(matches!(err, TrustgateError::Parsing(_)));
}
