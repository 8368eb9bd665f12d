use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use trustgate_core::{ModelClient, ModelResponse, TrustgateError};

/// Replays queued responses in order and remembers every prompt it received.
#[derive(Clone)]
pub struct ScriptedModelClient {
    responses: Arc<Mutex<VecDeque<ModelResponse>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModelClient {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shorthand for a script of plain-text responses.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(ModelResponse::new).collect())
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn complete(&self, prompt: &str) -> Result<ModelResponse, TrustgateError> {
        self.prompts.lock().await.push(prompt.to_string());
        let mut responses = self.responses.lock().await;
        responses
            .pop_front()
            .ok_or_else(|| TrustgateError::Model("scripted client exhausted responses".to_string()))
    }
}
