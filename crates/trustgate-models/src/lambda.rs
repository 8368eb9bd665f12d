use async_trait::async_trait;
use trustgate_core::{ModelClient, ModelResponse, TrustgateError};

/// Wraps a closure so the answer can depend on the prompt.
pub struct FnModelClient<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    func: F,
}

impl<F> FnModelClient<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> ModelClient for FnModelClient<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    async fn complete(&self, prompt: &str) -> Result<ModelResponse, TrustgateError> {
        Ok(ModelResponse::new((self.func)(prompt)))
    }
}
