use std::path::PathBuf;

use trustgate_core::{ModelResponse, TokenUsage, TrustgateError};

#[test]
fn error_variants_render_messages() {
    let errors = vec![
        TrustgateError::DatasetNotFound(PathBuf::from("data/missing.jsonl")),
        TrustgateError::Parsing("test".into()),
        TrustgateError::SchemaMismatch("test".into()),
        TrustgateError::Validation("test".into()),
        TrustgateError::Model("test".into()),
        TrustgateError::RateLimit("test".into()),
        TrustgateError::Loader("test".into()),
        TrustgateError::Ledger("test".into()),
        TrustgateError::AuditLog("test".into()),
        TrustgateError::Config("test".into()),
    ];
    for err in &errors {
        assert!(!err.to_string().is_empty());
    }
    assert_eq!(
        errors[0].to_string(),
        "dataset not found: data/missing.jsonl"
    );
}

#[test]
fn response_accessors_expose_usage() {
    let response = ModelResponse::new("ok")
        .with_usage(TokenUsage::new(1000, 500))
        .with_model("gpt-test");

    assert_eq!(response.text(), "ok");
    assert_eq!(response.input_tokens(), Some(1000));
    assert_eq!(response.output_tokens(), Some(500));
    assert_eq!(response.usage.as_ref().unwrap().total_tokens, 1500);
    assert_eq!(response.model(), Some("gpt-test"));

    let bare = ModelResponse::new("7.0");
    assert!(bare.input_tokens().is_none());
    assert!(bare.model().is_none());
}
