//! TrustGate CLI: run one evaluator and append its records to the ledger.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Offline evaluation of language-model outputs
#[derive(Parser, Debug)]
#[command(name = "trustgate", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Ledger file (defaults to TRUSTGATE_LEDGER_PATH or results/evaluations.json)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Project label written into a new ledger
    #[arg(long, global = true)]
    project: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use an OpenAI-compatible backend with this model instead of the stand-in
    #[arg(long, global = true)]
    openai_model: Option<String>,

    /// Base URL of the OpenAI-compatible backend
    #[arg(long, global = true, requires = "openai_model")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Score resume variants and check the spread
    Bias {
        #[arg(long)]
        data: PathBuf,
    },
    /// Extract fields from passages
    Fact {
        #[arg(long)]
        data: PathBuf,
    },
    /// Grade candidate answers against references
    Judge {
        #[arg(long)]
        data: PathBuf,
    },
    /// Classify replies to prompt-injection attacks
    Injection {
        #[arg(long)]
        data: PathBuf,
    },
    /// Classification metrics for intent predictions
    Intent {
        #[arg(long)]
        data: PathBuf,
        /// Where intent_eval.json and intent_eval.csv are written
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
    /// Word and character error rates for transcripts
    Wer {
        #[arg(long = "ref")]
        reference: PathBuf,
        #[arg(long)]
        pred: PathBuf,
    },
    /// Summarise the usage audit log into one ledger record
    Usage {
        /// Audit log (defaults to TRUSTGATE_AUDIT_LOG or results/usage_audit.jsonl)
        #[arg(long)]
        log: Option<PathBuf>,
        #[arg(long, default_value = "usage_summary")]
        name: String,
    },
    /// Show what the ledger holds
    Ledger,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    commands::run(cli).await
}
