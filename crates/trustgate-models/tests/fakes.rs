use trustgate_core::{ModelClient, ModelResponse, TokenUsage, TrustgateError};
use trustgate_models::{FixedModelClient, FnModelClient, ScriptedModelClient};

#[tokio::test]
async fn fixed_client_ignores_prompt() {
    let client = FixedModelClient::default();
    let a = client.complete("score this resume").await.unwrap();
    let b = client.complete("something else entirely").await.unwrap();

    assert_eq!(a.text, "7.0");
    assert_eq!(a, b);
}

#[tokio::test]
async fn fixed_client_carries_usage_and_model() {
    let client = FixedModelClient::new("ok")
        .with_usage(TokenUsage::new(10, 4))
        .with_model("fixed-test");
    let resp = client.complete("hi").await.unwrap();

    assert_eq!(resp.input_tokens(), Some(10));
    assert_eq!(resp.output_tokens(), Some(4));
    assert_eq!(resp.model(), Some("fixed-test"));
}

#[tokio::test]
async fn scripted_client_replays_in_order_and_records_prompts() {
    let client = ScriptedModelClient::new(vec![
        ModelResponse::new("first"),
        ModelResponse::new("second"),
    ]);

    assert_eq!(client.complete("p1").await.unwrap().text, "first");
    assert_eq!(client.complete("p2").await.unwrap().text, "second");
    assert_eq!(client.prompts().await, vec!["p1", "p2"]);
    assert_eq!(client.remaining().await, 0);
}

#[tokio::test]
async fn scripted_client_errors_when_exhausted() {
    let client = ScriptedModelClient::from_texts(["only"]);
    client.complete("a").await.unwrap();

    let err = client.complete("b").await.unwrap_err();
    assert!(matches!(err, TrustgateError::Model(_)));
}

#[tokio::test]
async fn fn_client_answers_from_prompt() {
    let client = FnModelClient::new(|prompt: &str| {
        if prompt.contains("city") {
            "Chicago".to_string()
        } else {
            "unknown".to_string()
        }
    });

    assert_eq!(client.complete("Which city?").await.unwrap().text, "Chicago");
    assert_eq!(client.complete("Which name?").await.unwrap().text, "unknown");
}
