//! Command-line definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use evalog_common::{HeaderCheck, OutputFormat};

use crate::logging::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "evalog", version)]
#[command(about = "Structured experiment logging for model evaluations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Experiment log destination (or set EVALOG_LOG_PATH)
    #[arg(long, global = true)]
    pub log_path: Option<PathBuf>,

    /// Config file (or set EVALOG_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Prefix for synthesized run IDs
    #[arg(long, global = true)]
    pub run_id_prefix: Option<String>,

    /// What to do when the existing log header differs from the schema
    #[arg(long, global = true, value_enum)]
    pub header_check: Option<HeaderCheck>,

    /// Result format on stdout
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Diagnostic log format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Increase diagnostic verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Append one experiment record to the log
    Log(LogArgs),

    /// Append the canonical sample record
    Smoke,

    /// Compute relevance and factuality for an answer
    Score(ScoreArgs),

    /// Print the log schema
    Schema,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Run identifier; synthesized when omitted
    #[arg(long)]
    pub run_id: Option<String>,

    /// Do not synthesize a run identifier
    #[arg(long)]
    pub no_auto_id: bool,

    #[arg(long)]
    pub task: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    /// Raw prompt text; stored as its hash
    #[arg(long, conflicts_with = "prompt_hash")]
    pub prompt: Option<String>,

    #[arg(long)]
    pub prompt_hash: Option<String>,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub input_tokens: Option<i64>,

    #[arg(long)]
    pub output_tokens: Option<i64>,

    #[arg(long)]
    pub latency_ms: Option<f64>,

    #[arg(long)]
    pub score_relevance: Option<f64>,

    #[arg(long)]
    pub score_factuality: Option<f64>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub error_type: Option<String>,

    #[arg(long)]
    pub error_message: Option<String>,

    /// Extra `key=value` field; keys outside the schema are dropped
    #[arg(long = "field", value_parser = parse_key_val)]
    pub fields: Vec<(String, String)>,

    #[command(flatten)]
    pub scoring: ScoringInputs,
}

/// Text inputs for computing scores while logging.
#[derive(Debug, Args, Default)]
pub struct ScoringInputs {
    /// Term expected in a good answer (repeatable)
    #[arg(long = "reference-term")]
    pub reference_terms: Vec<String>,

    /// Source context for the factuality score
    #[arg(long)]
    pub context: Option<String>,

    /// Generated answer to score
    #[arg(long)]
    pub answer: Option<String>,
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    /// Term expected in a good answer (repeatable)
    #[arg(long = "reference-term")]
    pub reference_terms: Vec<String>,

    /// Source context for the factuality score
    #[arg(long, default_value = "")]
    pub context: String,

    /// Generated answer to score
    #[arg(long)]
    pub answer: String,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}
