use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value};
use trustgate_core::{ModelClient, ModelResponse, TokenUsage, TrustgateError};

use crate::backend::{ProviderBackend, ProviderRequest, ProviderResponse};

#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub system_prompt: Option<String>,
}

impl OpenAiCompatConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: None,
            temperature: None,
            system_prompt: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// `ModelClient` for any endpoint speaking the OpenAI chat-completions protocol.
///
/// The prompt is sent as a single user message. Failures are surfaced
/// unchanged; there is no retry or timeout at this layer.
pub struct OpenAiCompatClient {
    config: OpenAiCompatConfig,
    backend: Arc<dyn ProviderBackend>,
}

impl OpenAiCompatClient {
    pub fn new(config: OpenAiCompatConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &OpenAiCompatConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str) -> ProviderRequest {
        let mut messages = Vec::new();
        if let Some(system) = &self.config.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "stream": false,
        });
        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temp) = self.config.temperature {
            body["temperature"] = json!(temp);
        }

        ProviderRequest {
            url: format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')),
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.config.api_key),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }

    fn parse_response(&self, resp: &ProviderResponse) -> Result<ModelResponse, TrustgateError> {
        check_error_status(resp)?;

        let content = resp.body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                TrustgateError::Parsing("response has no choices[0].message.content".to_string())
            })?;

        let model = resp.body["model"]
            .as_str()
            .unwrap_or(&self.config.model)
            .to_string();

        let mut response = ModelResponse::new(content).with_model(model);
        if let Some(usage) = parse_usage(&resp.body["usage"]) {
            response = response.with_usage(usage);
        }
        Ok(response)
    }
}

fn check_error_status(resp: &ProviderResponse) -> Result<(), TrustgateError> {
    if resp.status == 429 {
        let msg = resp.body["error"]["message"]
            .as_str()
            .unwrap_or("rate limited")
            .to_string();
        return Err(TrustgateError::RateLimit(msg));
    }
    if resp.status >= 400 {
        let msg = resp.body["error"]["message"]
            .as_str()
            .unwrap_or("unknown API error")
            .to_string();
        return Err(TrustgateError::Model(format!(
            "API error ({}): {}",
            resp.status, msg
        )));
    }
    Ok(())
}

fn parse_usage(usage: &Value) -> Option<TokenUsage> {
    if usage.is_null() {
        return None;
    }
    let input = usage["prompt_tokens"].as_u64().unwrap_or(0) as u32;
    let output = usage["completion_tokens"].as_u64().unwrap_or(0) as u32;
    Some(TokenUsage {
        input_tokens: input,
        output_tokens: output,
        total_tokens: usage["total_tokens"]
            .as_u64()
            .map(|t| t as u32)
            .unwrap_or_else(|| input.saturating_add(output)),
    })
}

#[async_trait]
impl ModelClient for OpenAiCompatClient {
    async fn complete(&self, prompt: &str) -> Result<ModelResponse, TrustgateError> {
        let request = self.build_request(prompt);
        let started = Instant::now();
        let resp = self.backend.send(request).await?;
        let latency_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            model = %self.config.model,
            status = resp.status,
            latency_ms,
            "completion received"
        );
        Ok(self.parse_response(&resp)?.with_latency_ms(latency_ms))
    }
}
