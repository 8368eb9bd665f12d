use trustgate_core::TrustgateError;
use trustgate_eval::{
    align, char_error_rate, edit_distance, evaluate_stt, evaluate_transcripts, load_transcripts,
    wer_record, word_error_rate, EditOps,
};

#[test]
fn identical_pairs_score_zero() {
    assert_eq!(word_error_rate("hello world", "hello world"), 0.0);
    assert_eq!(char_error_rate("hello world", "hello world"), 0.0);
}

#[test]
fn disjoint_single_words_score_one() {
    assert_eq!(word_error_rate("hello", "goodbye"), 1.0);
}

#[test]
fn wer_ignores_extra_whitespace() {
    assert_eq!(word_error_rate("  hello   world ", "hello world"), 0.0);
}

#[test]
fn empty_reference_conventions() {
    assert_eq!(char_error_rate("", "anything"), 0.0);
    assert_eq!(word_error_rate("", ""), 0.0);
    assert_eq!(word_error_rate("", "extra"), 1.0);
}

#[test]
fn edit_distance_classic() {
    let a: Vec<char> = "kitten".chars().collect();
    let b: Vec<char> = "sitting".chars().collect();
    assert_eq!(edit_distance(&a, &b), 3);
}

#[test]
fn align_counts_operations() {
    let ops = align(&["the", "cat", "sat"], &["the", "bat", "sat", "down"]);
    assert_eq!(
        ops,
        EditOps {
            hits: 2,
            substitutions: 1,
            deletions: 0,
            insertions: 1,
        }
    );
    let ops = align(&["a", "b", "c"], &["a", "c"]);
    assert_eq!(ops.deletions, 1);
    assert_eq!(ops.distance(), 1);
}

#[test]
fn corpus_cer_is_weighted_by_reference_length() {
    // Pair 1: 1 edit over 2 chars; pair 2: 0 edits over 8 chars.
    let report = evaluate_transcripts(&["ab", "abcdefgh"], &["ax", "abcdefgh"]);
    assert_eq!(report.cer_scores, vec![0.5, 0.0]);
    assert!((report.avg_cer - 0.1).abs() < 1e-12);
}

#[test]
fn avg_wer_is_mean_of_pairs() {
    let report = evaluate_transcripts(&["hello world", "good morning"], &["hello word", "good morning"]);
    assert_eq!(report.wer_scores, vec![0.5, 0.0]);
    assert_eq!(report.avg_wer, 0.25);
    assert_eq!(report.substitutions, 1);
    assert_eq!(report.hits, 3);
    assert!(report.warnings.is_empty());
}

#[test]
fn empty_reference_is_excluded_from_cer_totals() {
    let report = evaluate_transcripts(&["", "abcd"], &["zzz", "abce"]);
    assert_eq!(report.cer_scores, vec![0.0, 0.25]);
    assert_eq!(report.avg_cer, 0.25);
}

#[test]
fn length_mismatch_truncates_and_warns() {
    let report = evaluate_transcripts(&["a", "b", "c"], &["a", "b"]);
    assert_eq!(report.num_pairs, 2);
    assert_eq!(report.wer_scores.len(), 2);
    assert_eq!(report.warnings, vec!["line count mismatch: refs=3 preds=2".to_string()]);

    let record = wer_record("ref.txt|pred.txt", &report);
    assert_eq!(record.notes.as_deref(), Some("line count mismatch: refs=3 preds=2"));
}

#[test]
fn empty_inputs_give_zero_report() {
    let report = evaluate_transcripts::<String, String>(&[], &[]);
    assert_eq!(report.avg_wer, 0.0);
    assert_eq!(report.avg_cer, 0.0);
    assert_eq!(report.num_pairs, 0);
}

#[tokio::test]
async fn loads_plain_text_lines() {
    let path = tempdir().join("ref.txt");
    std::fs::write(&path, "\u{feff}hello world\n\n  good morning  \n").unwrap();
    let lines = load_transcripts(&path).await.unwrap();
    assert_eq!(lines, vec!["hello world", "good morning"]);
}

#[tokio::test]
async fn loads_json_lists_by_known_key() {
    let dir = tempdir();
    let refs = dir.join("expected.json");
    std::fs::write(&refs, r#"{"expected": ["hello world", "good morning"]}"#).unwrap();
    let preds = dir.join("pred.json");
    std::fs::write(&preds, r#"{"other": 1, "transcripts": ["hello word", "good morning"]}"#)
        .unwrap();

    assert_eq!(load_transcripts(&refs).await.unwrap().len(), 2);
    let report = evaluate_stt(&preds, &refs).await.unwrap();
    assert_eq!(report.avg_wer, 0.25);
}

#[tokio::test]
async fn json_without_known_key_falls_back_to_lines() {
    let path = tempdir().join("odd.json");
    std::fs::write(&path, "{\"x\": 1}").unwrap();
    assert_eq!(load_transcripts(&path).await.unwrap(), vec!["{\"x\": 1}"]);
}

#[tokio::test]
async fn empty_file_loads_nothing() {
    let path = tempdir().join("empty.txt");
    std::fs::write(&path, "  \n").unwrap();
    assert!(load_transcripts(&path).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_transcript_file() {
    let err = load_transcripts(tempdir().join("missing.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, TrustgateError::DatasetNotFound(_)));
}

#[test]
fn record_metrics() {
    let report = evaluate_transcripts(&["hello world"], &["hello word"]);
    let record = wer_record("data/ref.txt", &report);
    assert_eq!(record.eval_type, "wer");
    assert_eq!(record.metrics["avg_wer"], 0.5);
    assert_eq!(record.metrics["substitutions"], 1.0);
    assert_eq!(record.metrics["insertions"], 0.0);
    assert_eq!(record.num_examples, Some(1));
    assert_eq!(record.notes, None);
}

fn tempdir() -> std::path::PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "trustgate_test_wer_{}_{}",
        std::process::id(),
        id,
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
