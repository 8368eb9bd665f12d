use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use trustgate::core::{EvalConfig, EvaluationRecord, LedgerStore, ModelClient, TrustgateError};
use trustgate::eval::{
    bias_records, evaluate_intents, evaluate_stt, fact_records, intent_record, judge_records,
    load_bias_cases, load_fact_cases, load_judge_cases, load_prompt_injection_cases,
    prompt_injection_records, usage_summary_record, wer_record, BiasEvaluator, FactEvaluator,
    JudgeEvaluator, PromptInjectionEvaluator, UsageAuditLog,
};
use trustgate::ledger::EvaluationLedger;
use trustgate::models::{FixedModelClient, HttpBackend, OpenAiCompatClient, OpenAiCompatConfig};

use crate::{Cli, Commands};

const SCORE_STAND_IN: &str = "7.0";
const JUDGE_STAND_IN: &str = "SCORE: 5\nEXPLANATION: dummy baseline";
const REFUSAL_STAND_IN: &str = "I can't help with that. This request is unsafe.";

struct Runner {
    config: EvalConfig,
    ledger: EvaluationLedger,
    openai_model: Option<String>,
    base_url: Option<String>,
}

impl Runner {
    fn new(cli: &Cli) -> Self {
        let mut config = EvalConfig::from_env();
        if let Some(path) = &cli.ledger {
            config = config.with_ledger_path(path);
        }
        if let Some(project) = &cli.project {
            config = config.with_project(project);
        }
        Self {
            ledger: EvaluationLedger::from_config(&config),
            config,
            openai_model: cli.openai_model.clone(),
            base_url: cli.base_url.clone(),
        }
    }

    /// The real backend when `--openai-model` is given, otherwise a fixed
    /// stand-in answering `fallback` to every prompt.
    fn model(&self, fallback: &str) -> Result<Arc<dyn ModelClient>, TrustgateError> {
        let Some(model) = &self.openai_model else {
            return Ok(Arc::new(FixedModelClient::new(fallback)));
        };
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TrustgateError::Config("OPENAI_API_KEY is not set".to_string()))?;
        let mut config = OpenAiCompatConfig::new(api_key, model);
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        tracing::info!(model = %model, base_url = %config.base_url, "using OpenAI-compatible backend");
        Ok(Arc::new(OpenAiCompatClient::new(
            config,
            Arc::new(HttpBackend::new()),
        )))
    }

    async fn record(&self, records: Vec<EvaluationRecord>) -> anyhow::Result<usize> {
        let appended = records.len();
        let total = self
            .ledger
            .append(records)
            .await
            .with_context(|| format!("appending to {}", self.ledger.path().display()))?;
        tracing::info!(appended, total, "ledger updated");
        Ok(total)
    }

    fn report(&self, summary: String, total: usize) {
        println!(
            "{summary} -> {} ({total} records)",
            self.ledger.path().display()
        );
    }
}

fn dataset_name(path: &Path) -> String {
    path.display().to_string()
}

pub(crate) async fn run(cli: Cli) -> anyhow::Result<()> {
    let runner = Runner::new(&cli);

    match cli.command {
        Commands::Bias { data } => {
            let cases = load_bias_cases(&data).await?;
            let results = BiasEvaluator::new(runner.model(SCORE_STAND_IN)?)
                .evaluate_suite(&cases)
                .await?;
            let passed = results.iter().filter(|r| r.passed).count();
            let total = runner
                .record(bias_records(&dataset_name(&data), &results))
                .await?;
            runner.report(format!("bias: {passed}/{} passed", results.len()), total);
        }
        Commands::Fact { data } => {
            let cases = load_fact_cases(&data).await?;
            let results = FactEvaluator::new(runner.model(SCORE_STAND_IN)?)
                .evaluate_suite(&cases)
                .await?;
            let total = runner
                .record(fact_records(&dataset_name(&data), &results))
                .await?;
            runner.report(format!("fact: {} cases extracted", results.len()), total);
        }
        Commands::Judge { data } => {
            let cases = load_judge_cases(&data).await?;
            let results = JudgeEvaluator::new(runner.model(JUDGE_STAND_IN)?)
                .evaluate_suite(&cases)
                .await?;
            let mean = if results.is_empty() {
                0.0
            } else {
                results.iter().map(|r| r.normalized_score()).sum::<f64>() / results.len() as f64
            };
            let total = runner
                .record(judge_records(&dataset_name(&data), &results))
                .await?;
            runner.report(
                format!("judge: {} cases, mean normalized score {mean:.3}", results.len()),
                total,
            );
        }
        Commands::Injection { data } => {
            let cases = load_prompt_injection_cases(&data).await?;
            let results = PromptInjectionEvaluator::new(runner.model(REFUSAL_STAND_IN)?)
                .evaluate_suite(&cases)
                .await?;
            let correct = results.iter().filter(|r| r.is_correct).count();
            let total = runner
                .record(prompt_injection_records(&dataset_name(&data), &results))
                .await?;
            runner.report(
                format!("injection: {correct}/{} correct", results.len()),
                total,
            );
        }
        Commands::Intent { data, results_dir } => {
            let results_dir = results_dir.unwrap_or_else(|| runner.config.results_dir.clone());
            let evaluation = evaluate_intents(&data, &results_dir).await?;
            let total = runner
                .record(vec![intent_record(&dataset_name(&data), &evaluation.report)])
                .await?;
            runner.report(
                format!(
                    "intent: accuracy {:.3}, macro f1 {:.3}, reports in {}",
                    evaluation.report.accuracy,
                    evaluation.report.macro_avg.f1_score,
                    results_dir.display()
                ),
                total,
            );
        }
        Commands::Wer { reference, pred } => {
            let report = evaluate_stt(&pred, &reference).await?;
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            let dataset = format!("{}|{}", dataset_name(&reference), dataset_name(&pred));
            let total = runner.record(vec![wer_record(&dataset, &report)]).await?;
            runner.report(
                format!("wer: WER {:.3}, CER {:.3}", report.avg_wer, report.avg_cer),
                total,
            );
        }
        Commands::Usage { log, name } => {
            let path = log.unwrap_or_else(|| runner.config.audit_log_path.clone());
            let records = UsageAuditLog::new(&path).read().await?;
            let summary = usage_summary_record(&name, &dataset_name(&path), &records);
            let cost = summary.metrics.get("total_cost_usd").copied().unwrap_or_default();
            let total = runner.record(vec![summary]).await?;
            runner.report(
                format!("usage: {} calls, ${cost:.6}", records.len()),
                total,
            );
        }
        Commands::Ledger => {
            let document = runner.ledger.load().await?;
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for record in &document.evaluations {
                *counts.entry(record.eval_type.as_str()).or_default() += 1;
            }
            println!("project: {}", document.project);
            println!("run_id: {}", document.run_id);
            println!("records: {}", document.evaluations.len());
            for (eval_type, count) in counts {
                println!("  {eval_type}: {count}");
            }
        }
    }
    Ok(())
}
