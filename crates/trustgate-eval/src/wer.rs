//! Word and character error rates for speech-to-text transcripts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trustgate_core::{EvaluationRecord, TrustgateError};

use crate::dataset::read_dataset;

/// Keys probed, in order, when a transcript file is a JSON object.
const TRANSCRIPT_KEYS: &[&str] = &["expected", "predicted", "refs", "preds", "transcripts"];

/// Edit operations from a minimum-cost alignment of two token sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOps {
    pub hits: usize,
    pub substitutions: usize,
    pub deletions: usize,
    pub insertions: usize,
}

impl EditOps {
    pub fn distance(&self) -> usize {
        self.substitutions + self.deletions + self.insertions
    }

    fn add(&mut self, other: EditOps) {
        self.hits += other.hits;
        self.substitutions += other.substitutions;
        self.deletions += other.deletions;
        self.insertions += other.insertions;
    }
}

/// Levenshtein alignment of `hypothesis` against `reference`.
///
/// On ties the backtrace prefers a match or substitution, then a deletion,
/// then an insertion.
pub fn align<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> EditOps {
    let n = reference.len();
    let m = hypothesis.len();

    let mut d = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in d[0].iter_mut().enumerate() {
        *cell = j;
    }
    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(reference[i - 1] != hypothesis[j - 1]);
            d[i][j] = (d[i - 1][j - 1] + cost)
                .min(d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1);
        }
    }

    let mut ops = EditOps::default();
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let cost = usize::from(reference[i - 1] != hypothesis[j - 1]);
            if d[i][j] == d[i - 1][j - 1] + cost {
                if cost == 0 {
                    ops.hits += 1;
                } else {
                    ops.substitutions += 1;
                }
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && d[i][j] == d[i - 1][j] + 1 {
            ops.deletions += 1;
            i -= 1;
        } else {
            ops.insertions += 1;
            j -= 1;
        }
    }
    ops
}

pub fn edit_distance<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> usize {
    align(reference, hypothesis).distance()
}

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// WER of a single pair. An empty reference scores 0 against an empty
/// prediction and 1 against anything else.
pub fn word_error_rate(reference: &str, prediction: &str) -> f64 {
    let reference = words(reference);
    let prediction = words(prediction);
    if reference.is_empty() {
        return if prediction.is_empty() { 0.0 } else { 1.0 };
    }
    edit_distance(&reference, &prediction) as f64 / reference.len() as f64
}

/// CER of a single pair, 0 when the reference is empty.
pub fn char_error_rate(reference: &str, prediction: &str) -> f64 {
    let reference: Vec<char> = reference.chars().collect();
    if reference.is_empty() {
        return 0.0;
    }
    let prediction: Vec<char> = prediction.chars().collect();
    edit_distance(&reference, &prediction) as f64 / reference.len() as f64
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WerReport {
    /// Mean of the per-pair WERs.
    pub avg_wer: f64,
    /// Total character distance over total reference characters.
    pub avg_cer: f64,
    pub wer_scores: Vec<f64>,
    pub cer_scores: Vec<f64>,
    pub substitutions: usize,
    pub deletions: usize,
    pub insertions: usize,
    pub hits: usize,
    pub num_pairs: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Score reference/prediction transcripts pairwise by position.
///
/// Sequences of different length are truncated to the shorter one and a
/// warning is recorded.
pub fn evaluate_transcripts<R, P>(refs: &[R], preds: &[P]) -> WerReport
where
    R: AsRef<str>,
    P: AsRef<str>,
{
    let mut report = WerReport::default();
    if refs.len() != preds.len() {
        let warning = format!(
            "line count mismatch: refs={} preds={}",
            refs.len(),
            preds.len()
        );
        tracing::warn!(refs = refs.len(), preds = preds.len(), "transcript count mismatch");
        report.warnings.push(warning);
    }

    let mut word_ops = EditOps::default();
    let mut total_chars = 0usize;
    let mut total_char_distance = 0usize;

    for (reference, prediction) in refs.iter().zip(preds) {
        let (reference, prediction) = (reference.as_ref(), prediction.as_ref());

        report.wer_scores.push(word_error_rate(reference, prediction));
        word_ops.add(align(&words(reference), &words(prediction)));

        let ref_chars: Vec<char> = reference.chars().collect();
        if ref_chars.is_empty() {
            report.cer_scores.push(0.0);
            continue;
        }
        let pred_chars: Vec<char> = prediction.chars().collect();
        let distance = edit_distance(&ref_chars, &pred_chars);
        report
            .cer_scores
            .push(distance as f64 / ref_chars.len() as f64);
        total_chars += ref_chars.len();
        total_char_distance += distance;
    }

    report.num_pairs = report.wer_scores.len();
    report.avg_wer = if report.wer_scores.is_empty() {
        0.0
    } else {
        report.wer_scores.iter().sum::<f64>() / report.wer_scores.len() as f64
    };
    report.avg_cer = if total_chars > 0 {
        total_char_distance as f64 / total_chars as f64
    } else {
        0.0
    };
    report.substitutions = word_ops.substitutions;
    report.deletions = word_ops.deletions;
    report.insertions = word_ops.insertions;
    report.hits = word_ops.hits;
    report
}

/// Load transcripts from a JSON object or a plain text file.
///
/// A JSON object yields the list under the first present key of
/// `expected`, `predicted`, `refs`, `preds`, `transcripts`. Anything else is
/// read as one transcript per non-empty trimmed line.
pub async fn load_transcripts(path: impl AsRef<Path>) -> Result<Vec<String>, TrustgateError> {
    let path = path.as_ref();
    let contents = read_dataset(path).await?;
    let text = contents.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    if text.starts_with('{') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
            if let Some((key, value)) = TRANSCRIPT_KEYS
                .iter()
                .find_map(|key| map.get(*key).map(|v| (*key, v)))
            {
                return serde_json::from_value(value.clone()).map_err(|e| {
                    TrustgateError::SchemaMismatch(format!(
                        "{}: key {key:?} is not a list of strings: {e}",
                        path.display()
                    ))
                });
            }
        }
    }

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Load both transcript files and score them.
pub async fn evaluate_stt(
    pred_file: impl AsRef<Path>,
    ref_file: impl AsRef<Path>,
) -> Result<WerReport, TrustgateError> {
    let refs = load_transcripts(ref_file).await?;
    let preds = load_transcripts(pred_file).await?;
    let report = evaluate_transcripts(&refs, &preds);
    tracing::info!(
        pairs = report.num_pairs,
        avg_wer = report.avg_wer,
        avg_cer = report.avg_cer,
        "stt evaluation finished"
    );
    Ok(report)
}

pub fn wer_record(dataset: &str, report: &WerReport) -> EvaluationRecord {
    let mut record = EvaluationRecord::new("wer", "stt_eval", dataset)
        .with_metric("avg_wer", report.avg_wer)
        .with_metric("avg_cer", report.avg_cer)
        .with_metric("substitutions", report.substitutions as f64)
        .with_metric("deletions", report.deletions as f64)
        .with_metric("insertions", report.insertions as f64)
        .with_num_examples(report.num_pairs as u64)
        .with_tag("stt_eval");
    if !report.warnings.is_empty() {
        record = record.with_notes(report.warnings.join("; "));
    }
    record
}
