use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trustgate_core::{EvalConfig, EvaluationRecord, LedgerStore, TrustgateError, DEFAULT_PROJECT};

/// The persisted ledger document.
///
/// `run_id` is stamped once when the document is first created and never
/// touched again. Top-level keys this crate does not know about are carried
/// through appends untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub run_id: String,
    pub project: String,
    #[serde(default)]
    pub evaluations: Vec<EvaluationRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LedgerDocument {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            run_id: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            project: project.into(),
            evaluations: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A ledger backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct EvaluationLedger {
    path: PathBuf,
    project: String,
}

impl EvaluationLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            project: DEFAULT_PROJECT.to_string(),
        }
    }

    pub fn from_config(config: &EvalConfig) -> Self {
        Self::new(&config.ledger_path).with_project(&config.project)
    }

    /// Project label written into a freshly created document. Existing
    /// documents keep the label they were created with.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or synthesize a fresh one (not yet persisted) when
    /// the file does not exist.
    pub async fn load(&self) -> Result<LedgerDocument, TrustgateError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                TrustgateError::Parsing(format!("failed to parse {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "ledger absent, starting a new document");
                Ok(LedgerDocument::new(&self.project))
            }
            Err(e) => Err(TrustgateError::Ledger(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write(&self, document: &LedgerDocument) -> Result<(), TrustgateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                TrustgateError::Ledger(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| TrustgateError::Ledger(format!("failed to serialize ledger: {e}")))?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            TrustgateError::Ledger(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl LedgerStore for EvaluationLedger {
    async fn append(&self, records: Vec<EvaluationRecord>) -> Result<usize, TrustgateError> {
        for record in &records {
            record.validate()?;
        }

        let mut document = self.load().await?;
        let added = records.len();
        document.evaluations.extend(records);
        self.write(&document).await?;

        tracing::debug!(
            path = %self.path.display(),
            added,
            total = document.evaluations.len(),
            "ledger updated"
        );
        Ok(document.evaluations.len())
    }

    async fn records(&self) -> Result<Vec<EvaluationRecord>, TrustgateError> {
        Ok(self.load().await?.evaluations)
    }
}
