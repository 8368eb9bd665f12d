use std::sync::Arc;

use trustgate_core::TrustgateError;
use trustgate_eval::{
    build_judge_prompt, clamp_score, judge_records, load_judge_cases, parse_explanation,
    parse_judge_score, JudgeCase, JudgeEvaluator,
};
use trustgate_models::FixedModelClient;

fn case(max_score: f64) -> JudgeCase {
    JudgeCase {
        id: "q1".to_string(),
        prompt: "Capital of France?".to_string(),
        reference: "Paris".to_string(),
        candidate: "Paris".to_string(),
        max_score,
    }
}

#[test]
fn parses_score_and_explanation() {
    let text = "SCORE: 8\nEXPLANATION: mostly right";
    assert_eq!(parse_judge_score(text).unwrap(), 8.0);
    assert_eq!(parse_explanation(text), "mostly right");
}

#[test]
fn score_prefix_is_case_insensitive() {
    assert_eq!(parse_judge_score("Some preamble\nscore: 6.5").unwrap(), 6.5);
}

#[test]
fn first_score_line_wins() {
    assert_eq!(parse_judge_score("SCORE: 3\nSCORE: 9").unwrap(), 3.0);
}

#[test]
fn missing_explanation_defaults_to_empty() {
    assert_eq!(parse_explanation("SCORE: 4"), "");
}

#[test]
fn missing_score_line_is_parse_error() {
    let err = parse_judge_score("EXPLANATION: no score here").unwrap_err();
    assert!(matches!(err, TrustgateError::Parsing(_)));
}

#[test]
fn non_numeric_score_is_parse_error() {
    let err = parse_judge_score("SCORE: high").unwrap_err();
    assert!(matches!(err, TrustgateError::Parsing(_)));
}

#[test]
fn clamp_keeps_scores_in_range() {
    assert_eq!(clamp_score(15.0, 10.0), 10.0);
    assert_eq!(clamp_score(-2.0, 10.0), 0.0);
    assert_eq!(clamp_score(4.0, 10.0), 4.0);
    assert_eq!(clamp_score(f64::NAN, 10.0), 0.0);
}

#[test]
fn prompt_names_all_three_inputs() {
    let prompt = build_judge_prompt("Q?", "ref", "cand");
    assert!(prompt.starts_with("You are an impartial evaluator."));
    assert!(prompt.contains("SCORE: <number>"));
    assert!(prompt.ends_with("Question: Q?\nReference: ref\nCandidate: cand"));
}

#[tokio::test]
async fn out_of_range_score_is_clamped() {
    let model = FixedModelClient::new("SCORE: 15\nEXPLANATION: generous");
    let evaluator = JudgeEvaluator::new(Arc::new(model));
    let result = evaluator.evaluate_case(&case(10.0)).await.unwrap();

    assert_eq!(result.score, 10.0);
    assert_eq!(result.explanation, "generous");
    assert_eq!(result.normalized_score(), 1.0);
}

#[tokio::test]
async fn records_carry_normalized_score() {
    let model = FixedModelClient::new("SCORE: 5\nEXPLANATION: dummy baseline");
    let evaluator = JudgeEvaluator::new(Arc::new(model));
    let results = evaluator.evaluate_suite(&[case(10.0)]).await.unwrap();

    let record = &judge_records("data/judge.jsonl", &results)[0];
    assert_eq!(record.eval_type, "judge");
    assert_eq!(record.metrics["score"], 5.0);
    assert_eq!(record.metrics["max_score"], 10.0);
    assert_eq!(record.metrics["normalized_score"], 0.5);
    assert_eq!(record.notes.as_deref(), Some("dummy baseline"));
}

#[tokio::test]
async fn zero_max_score_normalizes_to_zero() {
    let model = FixedModelClient::new("SCORE: 5");
    let evaluator = JudgeEvaluator::new(Arc::new(model));
    let result = evaluator.evaluate_case(&case(0.0)).await.unwrap();

    assert_eq!(result.score, 0.0);
    assert_eq!(result.normalized_score(), 0.0);
}

#[tokio::test]
async fn loads_cases_with_default_max_score() {
    let path = tempdir().join("judge.jsonl");
    std::fs::write(
        &path,
        "{\"id\":\"j1\",\"prompt\":\"p\",\"reference\":\"r\",\"candidate\":\"c\"}\n",
    )
    .unwrap();

    let cases = load_judge_cases(&path).await.unwrap();
    assert_eq!(cases[0].max_score, 10.0);
}

fn tempdir() -> std::path::PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "trustgate_test_judge_{}_{}",
        std::process::id(),
        id,
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
