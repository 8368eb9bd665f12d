use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use trustgate_core::{EvaluationRecord, ModelClient, TrustgateError};

use crate::dataset::load_jsonl;

const FACT_PROMPT_TEMPLATE: &str = r#"Extract a fact from the passage below.

Return ONLY the extracted text with no explanation.

Passage:
{passage}

Question: {question}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCase {
    pub id: String,
    pub passage: String,
    /// Field name -> question asked of the passage.
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactResult {
    pub id: String,
    /// Field name -> trimmed model answer.
    pub extracted: BTreeMap<String, String>,
}

pub fn build_fact_prompt(passage: &str, question: &str) -> String {
    FACT_PROMPT_TEMPLATE
        .replace("{passage}", passage)
        .replace("{question}", question)
        .trim()
        .to_string()
}

/// Asks the model one question per field and keeps the answers verbatim.
pub struct FactEvaluator {
    model: Arc<dyn ModelClient>,
}

impl FactEvaluator {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    pub async fn evaluate_case(&self, case: &FactCase) -> Result<FactResult, TrustgateError> {
        let mut extracted = BTreeMap::new();
        for (field, question) in &case.fields {
            let prompt = build_fact_prompt(&case.passage, question);
            let response = self.model.complete(&prompt).await?;
            extracted.insert(field.clone(), response.text().trim().to_string());
        }
        tracing::debug!(case = %case.id, fields = extracted.len(), "fact case extracted");
        Ok(FactResult {
            id: case.id.clone(),
            extracted,
        })
    }

    pub async fn evaluate_suite(
        &self,
        cases: &[FactCase],
    ) -> Result<Vec<FactResult>, TrustgateError> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push(self.evaluate_case(case).await?);
        }
        tracing::info!(cases = results.len(), "fact suite finished");
        Ok(results)
    }
}

pub async fn load_fact_cases(path: impl AsRef<Path>) -> Result<Vec<FactCase>, TrustgateError> {
    load_jsonl(path).await
}

/// Fact extraction has no gold values, so every completed case passes.
pub fn fact_records(dataset: &str, results: &[FactResult]) -> Vec<EvaluationRecord> {
    results
        .iter()
        .map(|r| {
            let fields: Vec<&str> = r.extracted.keys().map(String::as_str).collect();
            EvaluationRecord::new("fact", &r.id, dataset)
                .with_metric("num_fields", r.extracted.len() as f64)
                .with_passed(true)
                .with_num_examples(1)
                .with_tag("fact_eval")
                .with_notes(format!("extracted_fields={fields:?}"))
        })
        .collect()
}
