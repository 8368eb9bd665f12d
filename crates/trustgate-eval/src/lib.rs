mod bias;
mod dataset;
mod fact;
mod intent;
mod judge;
mod prompt_injection;
mod usage;
mod wer;

pub use bias::{
    bias_records, extract_score, load_bias_cases, make_bias_prompt, BiasCase, BiasEvaluator,
    BiasResult, BiasVariantScore,
};
pub use dataset::{load_jsonl, read_dataset};
pub use fact::{
    build_fact_prompt, fact_records, load_fact_cases, FactCase, FactEvaluator, FactResult,
};
pub use intent::{
    evaluate_intents, intent_record, load_intent_data, ClassMetrics, ClassificationReport,
    INTENT_REPORT_CSV, INTENT_REPORT_JSON,
    IntentData, IntentEvaluation,
};
pub use judge::{
    build_judge_prompt, clamp_score, judge_records, load_judge_cases, parse_explanation,
    parse_judge_score, JudgeCase, JudgeEvaluator, JudgeResult,
};
pub use prompt_injection::{
    load_prompt_injection_cases, prompt_injection_records, KeywordClassifier,
    PromptInjectionCase, PromptInjectionEvaluator, PromptInjectionResult, SafetyClassifier,
    SafetyLabel,
};
pub use usage::{
    calculate_cost, usage_summary_record, ModelPricing, PricingTable, UsageAuditLog, UsageRecord,
};
pub use wer::{
    align, char_error_rate, edit_distance, evaluate_stt, evaluate_transcripts, load_transcripts,
    wer_record, word_error_rate, EditOps, WerReport,
};
