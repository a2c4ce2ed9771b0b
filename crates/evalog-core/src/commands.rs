//! Subcommand implementations.

use std::io::Write;

use evalog_common::{Error, FieldSchema, OutputFormat, Result};
use evalog_config::{resolve_config, CliOverrides, ResolvedConfig};
use evalog_math::{factuality, relevance, ScoreCard};
use evalog_telemetry::{ExperimentLog, Record, WriterConfig};
use serde_json::json;
use tracing::{debug, info};

use crate::cli::{Cli, Commands, LogArgs, ScoreArgs, ScoringInputs};
use crate::exit_codes::ExitCode;

/// Run the parsed command line, writing results to `out`.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<ExitCode> {
    match &cli.command {
        Commands::Log(args) => {
            let resolved = resolve(&cli, Some(!args.no_auto_id))?;
            let record = build_record(args);
            append_and_report(&resolved, record, cli.format, out)
        }
        Commands::Smoke => {
            let resolved = resolve(&cli, None)?;
            append_and_report(&resolved, smoke_record(), cli.format, out)
        }
        Commands::Score(args) => score(args, cli.format, out),
        Commands::Schema => schema(cli.format, out),
    }
}

fn resolve(cli: &Cli, auto_id: Option<bool>) -> Result<ResolvedConfig> {
    let overrides = CliOverrides {
        config: cli.config.clone(),
        log_path: cli.log_path.clone(),
        run_id_prefix: cli.run_id_prefix.clone(),
        // Only an explicit --no-auto-id overrides the config file.
        auto_id: auto_id.filter(|enabled| !enabled),
        header_check: cli.header_check,
    };
    resolve_config(&overrides)
}

fn append_and_report<W: Write>(
    resolved: &ResolvedConfig,
    record: Record,
    format: OutputFormat,
    out: &mut W,
) -> Result<ExitCode> {
    let config = WriterConfig::new(resolved.log_path.clone())
        .with_auto_id(resolved.config.auto_id)
        .with_run_id_prefix(resolved.config.run_id_prefix.clone())
        .with_header_check(resolved.config.header_check);
    let log = ExperimentLog::new(config);

    let record = log.prepare(record);
    let fields = log.writer().normalize(&record).to_json();
    let run_id = log.log(record)?;
    info!(run_id = %run_id, path = %log.path().display(), "logged run");

    match format {
        OutputFormat::Text => {
            writeln!(out, "Logged run {} -> {}", run_id, log.path().display())
                .map_err(stdout_error)?;
        }
        OutputFormat::Json => {
            let doc = json!({
                "run_id": run_id,
                "path": log.path().display().to_string(),
                "schema_version": log.writer().schema().version(),
                "record": fields,
            });
            writeln!(out, "{}", serde_json::to_string(&doc)?).map_err(stdout_error)?;
        }
    }
    Ok(ExitCode::Clean)
}

/// Build a record from `log` flags, computing scores from text inputs when
/// no explicit score was given.
pub fn build_record(args: &LogArgs) -> Record {
    // Free-form fields first so dedicated flags win on conflict.
    let mut record: Record = args.fields.iter().cloned().collect();
    if let Some(v) = &args.run_id {
        record = record.run_id(v.clone());
    }
    if let Some(v) = &args.task {
        record = record.task(v.clone());
    }
    if let Some(v) = &args.model {
        record = record.model(v.clone());
    }
    if let Some(v) = &args.prompt {
        record = record.prompt(v);
    }
    if let Some(v) = &args.prompt_hash {
        record = record.prompt_hash(v.clone());
    }
    if let Some(v) = args.temperature {
        record = record.temperature(v);
    }
    if let Some(v) = args.input_tokens {
        record = record.input_tokens(v);
    }
    if let Some(v) = args.output_tokens {
        record = record.output_tokens(v);
    }
    if let Some(v) = args.latency_ms {
        record = record.latency_ms(v);
    }
    if let Some(v) = &args.notes {
        record = record.notes(v.clone());
    }
    if let Some(v) = &args.error_type {
        record = record.set("error_type", v.clone());
    }
    if let Some(v) = &args.error_message {
        record = record.set("error_message", v.clone());
    }

    let (computed_relevance, computed_factuality) = computed_scores(&args.scoring);
    if let Some(v) = args.score_relevance.or(computed_relevance) {
        record = record.score_relevance(v);
    }
    if let Some(v) = args.score_factuality.or(computed_factuality) {
        record = record.score_factuality(v);
    }
    record
}

fn computed_scores(inputs: &ScoringInputs) -> (Option<f64>, Option<f64>) {
    let Some(answer) = inputs.answer.as_deref() else {
        return (None, None);
    };
    let rel = (!inputs.reference_terms.is_empty())
        .then(|| relevance(inputs.reference_terms.as_slice(), answer));
    let fact = inputs
        .context
        .as_deref()
        .map(|context| factuality(context, answer));
    debug!(relevance = ?rel, factuality = ?fact, "computed scores");
    (rel, fact)
}

/// The canonical sample record written by `evalog smoke`.
pub fn smoke_record() -> Record {
    Record::new()
        .task("smoke_test")
        .model("openai:gpt-4o-mini")
        .prompt_hash("demo123")
        .temperature(0.0)
        .input_tokens(42)
        .output_tokens(17)
        .latency_ms(123.4)
        .score_relevance(1.0)
        .score_factuality(1.0)
        .notes("initial sanity")
}

fn score<W: Write>(args: &ScoreArgs, format: OutputFormat, out: &mut W) -> Result<ExitCode> {
    let card = ScoreCard::compute(args.reference_terms.as_slice(), &args.context, &args.answer);
    match format {
        OutputFormat::Text => writeln!(
            out,
            "relevance={} factuality={}",
            card.relevance, card.factuality
        )
        .map_err(stdout_error)?,
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string(&card)?).map_err(stdout_error)?
        }
    }
    Ok(ExitCode::Clean)
}

fn schema<W: Write>(format: OutputFormat, out: &mut W) -> Result<ExitCode> {
    let schema = FieldSchema::v1();
    match format {
        OutputFormat::Text => {
            writeln!(out, "# schema {}", schema.version()).map_err(stdout_error)?;
            for field in schema.fields() {
                writeln!(out, "{}", field).map_err(stdout_error)?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string(&schema)?).map_err(stdout_error)?;
        }
    }
    Ok(ExitCode::Clean)
}

fn stdout_error(e: std::io::Error) -> Error {
    Error::io("<stdout>", e)
}
