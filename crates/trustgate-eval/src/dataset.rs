use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::error::Category;
use trustgate_core::TrustgateError;

/// Read a dataset file as UTF-8 text.
pub async fn read_dataset(path: impl AsRef<Path>) -> Result<String, TrustgateError> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TrustgateError::DatasetNotFound(path.to_path_buf()))
        }
        Err(e) => Err(TrustgateError::Loader(format!(
            "cannot read {}: {e}",
            path.display()
        ))),
    }
}

/// Load newline-delimited JSON, one case object per line.
///
/// Blank lines are skipped. The first bad line fails the whole load:
/// syntax errors map to `Parsing`, missing or ill-typed keys to
/// `SchemaMismatch`.
pub async fn load_jsonl<T: DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<Vec<T>, TrustgateError> {
    let path = path.as_ref();
    let contents = read_dataset(path).await?;

    let mut items = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(line).map_err(|e| {
            let location = format!("{}:{}", path.display(), idx + 1);
            match e.classify() {
                Category::Data => TrustgateError::SchemaMismatch(format!("{location}: {e}")),
                _ => TrustgateError::Parsing(format!("{location}: {e}")),
            }
        })?;
        items.push(item);
    }

    tracing::debug!(path = %path.display(), cases = items.len(), "dataset loaded");
    Ok(items)
}
