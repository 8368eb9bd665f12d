//! Persistence for evaluation results.
//!
//! [`EvaluationLedger`] keeps every [`EvaluationRecord`] ever appended in one
//! pretty-printed JSON document. Each append loads the whole document, extends
//! it and writes it back. There is no locking: two processes appending at the
//! same time can lose one side's records, so callers serialize their runs.
//!
//! [`JsonlLog`] is the line-delimited append-only log used for usage audit
//! trails.

mod file_ledger;
mod in_memory;
mod jsonl;

pub use file_ledger::{EvaluationLedger, LedgerDocument};
pub use in_memory::InMemoryLedger;
pub use jsonl::JsonlLog;

pub use trustgate_core::{EvaluationRecord, LedgerStore};
