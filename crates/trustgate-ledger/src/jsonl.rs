use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use trustgate_core::TrustgateError;

/// Append-only log holding one JSON object per line.
pub struct JsonlLog<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonlLog<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &T) -> Result<(), TrustgateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                TrustgateError::AuditLog(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let mut line = serde_json::to_string(record)
            .map_err(|e| TrustgateError::AuditLog(format!("failed to serialize record: {e}")))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                TrustgateError::AuditLog(format!("failed to open {}: {e}", self.path.display()))
            })?;
        file.write_all(line.as_bytes()).await.map_err(|e| {
            TrustgateError::AuditLog(format!("failed to write {}: {e}", self.path.display()))
        })?;
        file.flush().await.map_err(|e| {
            TrustgateError::AuditLog(format!("failed to flush {}: {e}", self.path.display()))
        })
    }

    /// Read every record. A missing log reads as empty; the first malformed
    /// line aborts the read.
    pub async fn read(&self) -> Result<Vec<T>, TrustgateError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TrustgateError::AuditLog(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let mut records = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| {
                TrustgateError::Parsing(format!(
                    "{}:{}: malformed log line: {e}",
                    self.path.display(),
                    idx + 1
                ))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}
