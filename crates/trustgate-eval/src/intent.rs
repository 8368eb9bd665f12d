use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trustgate_core::{EvaluationRecord, TrustgateError};

use crate::dataset::read_dataset;

pub const INTENT_REPORT_JSON: &str = "intent_eval.json";
pub const INTENT_REPORT_CSV: &str = "intent_eval.csv";

/// Gold labels and predictions, paired by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentData {
    pub labels: Vec<String>,
    pub predictions: Vec<String>,
}

pub async fn load_intent_data(path: impl AsRef<Path>) -> Result<IntentData, TrustgateError> {
    let path = path.as_ref();
    let contents = read_dataset(path).await?;
    serde_json::from_str(&contents).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => {
            TrustgateError::SchemaMismatch(format!("{}: {e}", path.display()))
        }
        _ => TrustgateError::Parsing(format!("{}: {e}", path.display())),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: u64,
}

/// Per-label and averaged classification metrics.
///
/// Serializes to the familiar report layout: one object per label followed
/// by `accuracy`, `macro avg` and `weighted avg`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    #[serde(flatten)]
    pub per_class: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl ClassificationReport {
    /// Total support across every label.
    pub fn num_examples(&self) -> u64 {
        self.per_class.values().map(|m| m.support).sum()
    }

    fn to_csv(&self) -> Result<Vec<u8>, TrustgateError> {
        let csv_err = |e: csv::Error| TrustgateError::Ledger(format!("intent csv: {e}"));
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["label", "precision", "recall", "f1-score", "support"])
            .map_err(csv_err)?;

        let total = self.num_examples();
        let accuracy = ClassMetrics {
            precision: self.accuracy,
            recall: self.accuracy,
            f1_score: self.accuracy,
            support: total,
        };
        let rows = self
            .per_class
            .iter()
            .map(|(label, m)| (label.as_str(), m))
            .chain([
                ("accuracy", &accuracy),
                ("macro avg", &self.macro_avg),
                ("weighted avg", &self.weighted_avg),
            ]);
        for (label, m) in rows {
            writer
                .write_record([
                    label.to_string(),
                    m.precision.to_string(),
                    m.recall.to_string(),
                    m.f1_score.to_string(),
                    m.support.to_string(),
                ])
                .map_err(csv_err)?;
        }
        writer
            .into_inner()
            .map_err(|e| TrustgateError::Ledger(format!("intent csv: {e}")))
    }
}

/// A report plus the confusion matrix it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentEvaluation {
    pub report: ClassificationReport,
    /// Sorted union of true and predicted labels.
    pub labels: Vec<String>,
    /// `confusion_matrix[i][j]`: examples of `labels[i]` predicted as `labels[j]`.
    pub confusion_matrix: Vec<Vec<u64>>,
}

impl IntentEvaluation {
    pub fn from_labels<S: AsRef<str>>(
        y_true: &[S],
        y_pred: &[S],
    ) -> Result<Self, TrustgateError> {
        if y_true.len() != y_pred.len() {
            return Err(TrustgateError::Validation(format!(
                "labels and predictions differ in length: {} vs {}",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(TrustgateError::Validation(
                "no labels to evaluate".to_string(),
            ));
        }

        let labels: Vec<String> = y_true
            .iter()
            .chain(y_pred)
            .map(|l| l.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: BTreeMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let k = labels.len();
        let mut matrix = vec![vec![0u64; k]; k];
        for (t, p) in y_true.iter().zip(y_pred) {
            // Both lookups succeed: `labels` is built from these same values.
            if let (Some(&i), Some(&j)) = (index.get(t.as_ref()), index.get(p.as_ref())) {
                matrix[i][j] += 1;
            }
        }

        let total = y_true.len() as f64;
        let correct: u64 = (0..k).map(|i| matrix[i][i]).sum();

        let mut per_class = BTreeMap::new();
        let mut macro_sum = (0.0, 0.0, 0.0);
        let mut weighted_sum = (0.0, 0.0, 0.0);
        for (i, label) in labels.iter().enumerate() {
            let tp = matrix[i][i] as f64;
            let support: u64 = matrix[i].iter().sum();
            let predicted: u64 = matrix.iter().map(|row| row[i]).sum();

            let precision = safe_div(tp, predicted as f64);
            let recall = safe_div(tp, support as f64);
            let f1_score = safe_div(2.0 * precision * recall, precision + recall);

            macro_sum.0 += precision;
            macro_sum.1 += recall;
            macro_sum.2 += f1_score;
            let w = support as f64;
            weighted_sum.0 += precision * w;
            weighted_sum.1 += recall * w;
            weighted_sum.2 += f1_score * w;

            per_class.insert(
                label.clone(),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score,
                    support,
                },
            );
        }

        let n = y_true.len() as u64;
        let report = ClassificationReport {
            per_class,
            accuracy: correct as f64 / total,
            macro_avg: ClassMetrics {
                precision: macro_sum.0 / k as f64,
                recall: macro_sum.1 / k as f64,
                f1_score: macro_sum.2 / k as f64,
                support: n,
            },
            weighted_avg: ClassMetrics {
                precision: weighted_sum.0 / total,
                recall: weighted_sum.1 / total,
                f1_score: weighted_sum.2 / total,
                support: n,
            },
        };

        Ok(Self {
            report,
            labels,
            confusion_matrix: matrix,
        })
    }

    /// Write `intent_eval.json` and `intent_eval.csv` into `results_dir`.
    pub async fn write_reports(
        &self,
        results_dir: impl AsRef<Path>,
    ) -> Result<(PathBuf, PathBuf), TrustgateError> {
        let dir = results_dir.as_ref();
        let io_err = |path: &Path, e: std::io::Error| {
            TrustgateError::Ledger(format!("cannot write {}: {e}", path.display()))
        };
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| io_err(dir, e))?;

        let json_path = dir.join(INTENT_REPORT_JSON);
        let json = serde_json::to_string_pretty(&self.report)
            .map_err(|e| TrustgateError::Ledger(format!("intent report: {e}")))?;
        tokio::fs::write(&json_path, json)
            .await
            .map_err(|e| io_err(&json_path, e))?;

        let csv_path = dir.join(INTENT_REPORT_CSV);
        tokio::fs::write(&csv_path, self.report.to_csv()?)
            .await
            .map_err(|e| io_err(&csv_path, e))?;

        tracing::debug!(dir = %dir.display(), "intent reports written");
        Ok((json_path, csv_path))
    }
}

/// Load intent data, compute the report and persist it under `results_dir`.
pub async fn evaluate_intents(
    data_file: impl AsRef<Path>,
    results_dir: impl AsRef<Path>,
) -> Result<IntentEvaluation, TrustgateError> {
    let data = load_intent_data(data_file).await?;
    let evaluation = IntentEvaluation::from_labels(&data.labels, &data.predictions)?;
    evaluation.write_reports(results_dir).await?;
    tracing::info!(
        examples = evaluation.report.num_examples(),
        accuracy = evaluation.report.accuracy,
        "intent evaluation finished"
    );
    Ok(evaluation)
}

pub fn intent_record(dataset: &str, report: &ClassificationReport) -> EvaluationRecord {
    EvaluationRecord::new("intent", "intent_classification", dataset)
        .with_metric("accuracy", report.accuracy)
        .with_metric("macro_f1", report.macro_avg.f1_score)
        .with_num_examples(report.num_examples())
        .with_tag("offline_eval")
        .with_notes("per-label precision/recall/f1 report")
}
