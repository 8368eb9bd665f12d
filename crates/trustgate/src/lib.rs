//! TrustGate: offline evaluation of language-model outputs.
//!
//! This crate re-exports the TrustGate sub-crates for single-import usage.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `models`, `ledger`, `eval` |
//! | `models` | Deterministic model clients and the OpenAI-compatible adapter |
//! | `ledger` | JSON evaluation ledger, in-memory ledger, JSONL audit log |
//! | `eval` | Bias, Fact, Judge, PromptInjection, Usage, WER/CER and Intent evaluators |
//! | `full` | All features enabled |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trustgate::core::LedgerStore;
//! use trustgate::eval::{bias_records, load_bias_cases, BiasEvaluator};
//! use trustgate::ledger::EvaluationLedger;
//! use trustgate::models::FixedModelClient;
//!
//! let cases = load_bias_cases("data/bias_cases.jsonl").await?;
//! let results = BiasEvaluator::new(Arc::new(FixedModelClient::new("7.0")))
//!     .evaluate_suite(&cases)
//!     .await?;
//! EvaluationLedger::new("results/evaluations.json")
//!     .append(bias_records("data/bias_cases.jsonl", &results))
//!     .await?;
//! ```

/// Core traits and types: ModelClient, ModelResponse, EvaluationRecord,
/// LedgerStore, EvalConfig, TrustgateError. Always available.
pub use trustgate_core as core;

/// FixedModelClient, ScriptedModelClient, FnModelClient, ProviderBackend and
/// the OpenAI-compatible client.
#[cfg(feature = "models")]
pub use trustgate_models as models;

/// EvaluationLedger, InMemoryLedger and the JSONL log.
#[cfg(feature = "ledger")]
pub use trustgate_ledger as ledger;

/// Evaluators and their record translations.
#[cfg(feature = "eval")]
pub use trustgate_eval as eval;
