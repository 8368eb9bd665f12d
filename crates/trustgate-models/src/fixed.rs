use async_trait::async_trait;
use trustgate_core::{ModelClient, ModelResponse, TokenUsage, TrustgateError};

/// Deterministic stand-in that answers every prompt with the same text.
#[derive(Debug, Clone)]
pub struct FixedModelClient {
    response: ModelResponse,
}

impl FixedModelClient {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            response: ModelResponse::new(text),
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.response.usage = Some(usage);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.response.model = Some(model.into());
        self
    }
}

impl Default for FixedModelClient {
    fn default() -> Self {
        Self::new("7.0")
    }
}

#[async_trait]
impl ModelClient for FixedModelClient {
    async fn complete(&self, _prompt: &str) -> Result<ModelResponse, TrustgateError> {
        Ok(self.response.clone())
    }
}
