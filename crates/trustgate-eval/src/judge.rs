use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use trustgate_core::{EvaluationRecord, ModelClient, TrustgateError};

use crate::dataset::load_jsonl;

const JUDGE_PROMPT_TEMPLATE: &str = r#"You are an impartial evaluator.

Compare candidate answer to the reference.
Score correctness, factuality, and completeness from 0 to 10.

Return exactly:

SCORE: <number>
EXPLANATION: <short reason>

Question: {prompt}
Reference: {reference}
Candidate: {candidate}"#;

fn default_max_score() -> f64 {
    10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeCase {
    pub id: String,
    pub prompt: String,
    pub reference: String,
    pub candidate: String,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResult {
    pub id: String,
    /// Always within `[0, max_score]`.
    pub score: f64,
    pub max_score: f64,
    pub explanation: String,
    pub raw_response: String,
}

impl JudgeResult {
    pub fn normalized_score(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score
        } else {
            0.0
        }
    }
}

pub fn build_judge_prompt(prompt: &str, reference: &str, candidate: &str) -> String {
    JUDGE_PROMPT_TEMPLATE
        .replace("{prompt}", prompt)
        .replace("{reference}", reference)
        .replace("{candidate}", candidate)
        .trim()
        .to_string()
}

fn find_prefixed<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.lines()
        .find(|line| line.to_lowercase().starts_with(prefix))
        .and_then(|line| line.split_once(':'))
        .map(|(_, rest)| rest.trim())
}

/// Parse the first `SCORE:` line (case-insensitive) of a judge response.
pub fn parse_judge_score(text: &str) -> Result<f64, TrustgateError> {
    let value = find_prefixed(text.trim(), "score:").ok_or_else(|| {
        TrustgateError::Parsing(format!("judge response has no SCORE line: {text:?}"))
    })?;
    value.parse::<f64>().map_err(|_| {
        TrustgateError::Parsing(format!("could not parse judge score from: {value:?}"))
    })
}

/// The `EXPLANATION:` line, or an empty string when the model left it out.
pub fn parse_explanation(text: &str) -> String {
    find_prefixed(text.trim(), "explanation:")
        .unwrap_or_default()
        .to_string()
}

/// Clamp a parsed score into `[0, max_score]`. NaN clamps to 0.
pub fn clamp_score(score: f64, max_score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.min(max_score).max(0.0)
}

/// LLM-as-judge scoring of a candidate answer against a reference.
pub struct JudgeEvaluator {
    model: Arc<dyn ModelClient>,
}

impl JudgeEvaluator {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    pub async fn evaluate_case(&self, case: &JudgeCase) -> Result<JudgeResult, TrustgateError> {
        let prompt = build_judge_prompt(&case.prompt, &case.reference, &case.candidate);
        let response = self.model.complete(&prompt).await?;
        let raw = parse_judge_score(response.text())?;
        let score = clamp_score(raw, case.max_score);
        if score != raw {
            tracing::debug!(case = %case.id, raw, score, "judge score clamped");
        }
        Ok(JudgeResult {
            id: case.id.clone(),
            score,
            max_score: case.max_score,
            explanation: parse_explanation(response.text()),
            raw_response: response.text,
        })
    }

    pub async fn evaluate_suite(
        &self,
        cases: &[JudgeCase],
    ) -> Result<Vec<JudgeResult>, TrustgateError> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push(self.evaluate_case(case).await?);
        }
        tracing::info!(cases = results.len(), "judge suite finished");
        Ok(results)
    }
}

pub async fn load_judge_cases(path: impl AsRef<Path>) -> Result<Vec<JudgeCase>, TrustgateError> {
    load_jsonl(path).await
}

pub fn judge_records(dataset: &str, results: &[JudgeResult]) -> Vec<EvaluationRecord> {
    results
        .iter()
        .map(|r| {
            EvaluationRecord::new("judge", &r.id, dataset)
                .with_metric("score", r.score)
                .with_metric("max_score", r.max_score)
                .with_metric("normalized_score", r.normalized_score())
                .with_passed(true)
                .with_num_examples(1)
                .with_tag("judge_eval")
                .with_notes(&r.explanation)
        })
        .collect()
}
