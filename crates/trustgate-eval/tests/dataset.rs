use serde::Deserialize;
use trustgate_core::TrustgateError;
use trustgate_eval::load_jsonl;

#[derive(Debug, Deserialize, PartialEq)]
struct Row {
    id: String,
    n: u32,
}

#[tokio::test]
async fn skips_blank_lines() {
    let path = tempdir().join("rows.jsonl");
    std::fs::write(&path, "{\"id\":\"a\",\"n\":1}\n\n   \n{\"id\":\"b\",\"n\":2}\n").unwrap();

    let rows: Vec<Row> = load_jsonl(&path).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].id, "b");
    assert_eq!(rows[1].n, 2);
}

#[tokio::test]
async fn missing_file_is_dataset_not_found() {
    let path = tempdir().join("nope.jsonl");
    let err = load_jsonl::<Row>(&path).await.unwrap_err();
    match err {
        TrustgateError::DatasetNotFound(p) => assert_eq!(p, path),
        other => panic!("expected DatasetNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_line_fails_whole_load() {
    let path = tempdir().join("rows.jsonl");
    std::fs::write(&path, "{\"id\":\"a\",\"n\":1}\n{not json\n").unwrap();

    let err = load_jsonl::<Row>(&path).await.unwrap_err();
    match err {
        TrustgateError::Parsing(msg) => assert!(msg.contains(":2:"), "{msg}"),
        other => panic!("expected Parsing, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_key_is_schema_mismatch() {
    let path = tempdir().join("rows.jsonl");
    std::fs::write(&path, "{\"id\":\"a\"}\n").unwrap();

    let err = load_jsonl::<Row>(&path).await.unwrap_err();
    assert!(matches!(err, TrustgateError::SchemaMismatch(_)), "{err:?}");
}

fn tempdir() -> std::path::PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "trustgate_test_dataset_{}_{}",
        std::process::id(),
        id,
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
