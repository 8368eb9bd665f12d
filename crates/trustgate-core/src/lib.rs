use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Model responses
// ---------------------------------------------------------------------------

/// Token counts reported by a backend for a single completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

/// The result of one `ModelClient::complete` call.
///
/// Only `text` is always present. Token counts and the model identifier are
/// needed for usage accounting and are absent for most fakes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ModelResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            model: None,
            latency_ms: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn input_tokens(&self) -> Option<u32> {
        self.usage.as_ref().map(|u| u.input_tokens)
    }

    pub fn output_tokens(&self) -> Option<u32> {
        self.usage.as_ref().map(|u| u.output_tokens)
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Evaluation records
// ---------------------------------------------------------------------------

/// One row of the evaluation ledger.
///
/// Absent optional fields are written as `null` so documents stay
/// field-for-field comparable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub eval_type: String,
    pub name: String,
    pub dataset: String,
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub thresholds: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub num_examples: Option<u64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl EvaluationRecord {
    pub fn new(
        eval_type: impl Into<String>,
        name: impl Into<String>,
        dataset: impl Into<String>,
    ) -> Self {
        Self {
            eval_type: eval_type.into(),
            name: name.into(),
            dataset: dataset.into(),
            metrics: BTreeMap::new(),
            thresholds: None,
            passed: None,
            num_examples: None,
            tags: None,
            notes: None,
        }
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    pub fn with_threshold(mut self, key: impl Into<String>, value: f64) -> Self {
        self.thresholds
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_passed(mut self, passed: bool) -> Self {
        self.passed = Some(passed);
        self
    }

    pub fn with_num_examples(mut self, n: u64) -> Self {
        self.num_examples = Some(n);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check the structural constraints a record must satisfy before it is
    /// written to a ledger.
    pub fn validate(&self) -> Result<(), TrustgateError> {
        if self.eval_type.trim().is_empty() {
            return Err(TrustgateError::Validation(format!(
                "record {:?} has an empty eval_type",
                self.name
            )));
        }
        if self.metrics.is_empty() {
            return Err(TrustgateError::Validation(format!(
                "record {:?} ({}) must carry at least one metric",
                self.name, self.eval_type
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_PROJECT: &str = "TrustGate Evals";
pub const DEFAULT_LEDGER_PATH: &str = "results/evaluations.json";
pub const DEFAULT_AUDIT_LOG_PATH: &str = "results/usage_audit.jsonl";
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Where evaluator runs read and write their shared artefacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    pub ledger_path: PathBuf,
    pub audit_log_path: PathBuf,
    pub project: String,
    pub results_dir: PathBuf,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            audit_log_path: PathBuf::from(DEFAULT_AUDIT_LOG_PATH),
            project: DEFAULT_PROJECT.to_string(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
        }
    }
}

impl EvalConfig {
    /// Build a config from `TRUSTGATE_*` environment variables, falling back
    /// to the defaults for anything unset or empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            ledger_path: get("TRUSTGATE_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ledger_path),
            audit_log_path: get("TRUSTGATE_AUDIT_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.audit_log_path),
            project: get("TRUSTGATE_PROJECT").unwrap_or(defaults.project),
            results_dir: get("TRUSTGATE_RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
        }
    }

    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = path.into();
        self
    }

    pub fn with_audit_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_log_path = path.into();
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type shared by every TrustGate crate.
///
/// Nothing in the workspace retries on any variant.
#[derive(Debug, Error)]
pub enum TrustgateError {
    #[error("dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),
    #[error("parsing error: {0}")]
    Parsing(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("model error: {0}")]
    Model(String),
    #[error("rate limit: {0}")]
    RateLimit(String),
    #[error("loader error: {0}")]
    Loader(String),
    #[error("ledger error: {0}")]
    Ledger(String),
    #[error("audit log error: {0}")]
    AuditLog(String),
    #[error("config error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Core traits
// ---------------------------------------------------------------------------

/// A callable generative backend: prompt in, response out.
///
/// One call per invocation. Implementations must not retry; any backend
/// failure is returned to the caller as-is.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<ModelResponse, TrustgateError>;
}

/// Append-only storage for evaluation records.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append `records` in order and return the total number of stored records.
    async fn append(&self, records: Vec<EvaluationRecord>) -> Result<usize, TrustgateError>;

    /// All records currently stored, in append order.
    async fn records(&self) -> Result<Vec<EvaluationRecord>, TrustgateError>;
}
