use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use trustgate_core::{EvaluationRecord, LedgerStore, TrustgateError};

/// Process-local ledger, useful for tests and dry runs.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    records: Arc<RwLock<Vec<EvaluationRecord>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn append(&self, records: Vec<EvaluationRecord>) -> Result<usize, TrustgateError> {
        for record in &records {
            record.validate()?;
        }
        let mut stored = self.records.write().await;
        stored.extend(records);
        Ok(stored.len())
    }

    async fn records(&self) -> Result<Vec<EvaluationRecord>, TrustgateError> {
        Ok(self.records.read().await.clone())
    }
}
