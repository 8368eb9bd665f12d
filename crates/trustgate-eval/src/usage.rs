use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trustgate_core::{EvaluationRecord, ModelResponse, TrustgateError};
use trustgate_ledger::JsonlLog;

/// Per-token prices in US dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_token_cost: f64,
    pub output_token_cost: f64,
}

impl ModelPricing {
    pub fn new(input_token_cost: f64, output_token_cost: f64) -> Self {
        Self {
            input_token_cost,
            output_token_cost,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingTable {
    prices: HashMap<String, ModelPricing>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>, pricing: ModelPricing) -> Self {
        self.insert(model, pricing);
        self
    }

    pub fn insert(&mut self, model: impl Into<String>, pricing: ModelPricing) {
        self.prices.insert(model.into(), pricing);
    }

    pub fn get(&self, model: &str) -> Result<&ModelPricing, TrustgateError> {
        self.prices
            .get(model)
            .ok_or_else(|| TrustgateError::Validation(format!("no pricing for model {model:?}")))
    }
}

/// Linear cost: input and output tokens each priced per token.
pub fn calculate_cost(input_tokens: u64, output_tokens: u64, pricing: &ModelPricing) -> f64 {
    input_tokens as f64 * pricing.input_token_cost
        + output_tokens as f64 * pricing.output_token_cost
}

/// One auditable model call. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub trace_id: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub latency_ms: u64,
    pub cost_usd: f64,
    pub timestamp_ms: u64,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl UsageRecord {
    /// Price a response and stamp it with the current wall-clock time.
    ///
    /// Fails with `Validation` when the response carries no token counts or
    /// no model identifier.
    pub fn from_response(
        trace_id: impl Into<String>,
        response: &ModelResponse,
        pricing: &ModelPricing,
        latency_ms: u64,
        meta: Option<Map<String, Value>>,
    ) -> Result<Self, TrustgateError> {
        let usage = response.usage.as_ref().ok_or_else(|| {
            TrustgateError::Validation("response has no token usage".to_string())
        })?;
        let model = response
            .model()
            .ok_or_else(|| TrustgateError::Validation("response has no model id".to_string()))?;

        let input_tokens = u64::from(usage.input_tokens);
        let output_tokens = u64::from(usage.output_tokens);
        Ok(Self {
            trace_id: trace_id.into(),
            model: model.to_string(),
            input_tokens,
            output_tokens,
            latency_ms,
            cost_usd: calculate_cost(input_tokens, output_tokens, pricing),
            timestamp_ms: now_ms(),
            meta: meta.unwrap_or_default(),
        })
    }

    /// Like [`UsageRecord::from_response`], looking the price up by the
    /// response's model id. Latency comes from the response when it has one.
    pub fn from_priced_response(
        trace_id: impl Into<String>,
        response: &ModelResponse,
        table: &PricingTable,
        meta: Option<Map<String, Value>>,
    ) -> Result<Self, TrustgateError> {
        let model = response
            .model()
            .ok_or_else(|| TrustgateError::Validation("response has no model id".to_string()))?;
        let pricing = table.get(model)?;
        let latency_ms = response.latency_ms.unwrap_or_default();
        Self::from_response(trace_id, response, pricing, latency_ms, meta)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// The usage audit trail: one JSON object per line.
pub type UsageAuditLog = JsonlLog<UsageRecord>;

/// Roll a batch of usage records into a single ledger entry.
pub fn usage_summary_record(
    name: &str,
    dataset: &str,
    records: &[UsageRecord],
) -> EvaluationRecord {
    let total_cost: f64 = records.iter().map(|r| r.cost_usd).sum();
    let input: u64 = records.iter().map(|r| r.input_tokens).sum();
    let output: u64 = records.iter().map(|r| r.output_tokens).sum();
    let mean_latency = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| r.latency_ms as f64).sum::<f64>() / records.len() as f64
    };

    let mut models: Vec<&str> = records.iter().map(|r| r.model.as_str()).collect();
    models.sort_unstable();
    models.dedup();

    EvaluationRecord::new("usage", name, dataset)
        .with_metric("total_cost_usd", total_cost)
        .with_metric("total_input_tokens", input as f64)
        .with_metric("total_output_tokens", output as f64)
        .with_metric("mean_latency_ms", mean_latency)
        .with_num_examples(records.len() as u64)
        .with_tag("usage_eval")
        .with_notes(format!("models={}", models.join(",")))
}
