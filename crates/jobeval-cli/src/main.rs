//! jobeval CLI
//!
//! Evaluate a job posting against your criteria and print an APPLY /
//! DO_NOT_APPLY recommendation.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jobeval_core::{CriteriaConfig, EvaluationResult};
use jobeval_runtime::{
    AppConfig, MetricsCollector, ProviderRegistry, RunOptions, TracingSettings, WorkflowEngine,
};

mod telemetry;

#[derive(Parser, Debug)]
#[command(name = "jobeval")]
#[command(about = "Evaluate job postings against your criteria", long_about = None)]
#[command(version)]
struct Cli {
    /// Application config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level/filter when RUST_LOG is unset (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a job posting
    Evaluate(EvaluateArgs),

    /// Check configuration, provider credentials and tracing settings
    Check,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Posting text file (reads stdin when omitted or "-")
    input: Option<PathBuf>,

    /// Criteria file (YAML or JSON), replacing the config's criteria
    #[arg(long)]
    criteria: Option<PathBuf>,

    /// Minimum acceptable salary
    #[arg(long)]
    min_salary: Option<u64>,

    /// Require a remote position
    #[arg(long)]
    remote_required: Option<bool>,

    /// Seniority marker an IC title must contain (repeatable)
    #[arg(long = "title-marker")]
    title_markers: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Trace the extraction call separately from the workflow
    #[arg(long)]
    force_call_tracing: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    telemetry::init(&level)?;

    match cli.command {
        Commands::Evaluate(args) => evaluate(&config, args).await,
        Commands::Check => check(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

fn read_posting(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read posting {}", path.display())),
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read posting from stdin")?;
            Ok(buffer)
        }
    }
}

fn resolve_criteria(config: &AppConfig, args: &EvaluateArgs) -> Result<CriteriaConfig> {
    let mut criteria = match &args.criteria {
        Some(path) => CriteriaConfig::from_file(path)
            .with_context(|| format!("Failed to load criteria {}", path.display()))?,
        None => config.criteria.clone(),
    };

    if let Some(min_salary) = args.min_salary {
        criteria = criteria.with_min_salary(min_salary);
    }
    if let Some(remote_required) = args.remote_required {
        criteria = criteria.with_remote_required(remote_required);
    }
    if !args.title_markers.is_empty() {
        criteria = criteria.with_ic_title_requirements(args.title_markers.iter().cloned());
    }

    criteria.normalized().context("Invalid criteria")
}

async fn evaluate(config: &AppConfig, args: EvaluateArgs) -> Result<()> {
    let posting = read_posting(args.input.as_deref())?;
    let criteria = resolve_criteria(config, &args)?;

    let metrics = Arc::new(MetricsCollector::new());
    let registry = ProviderRegistry::with_defaults();
    let engine = WorkflowEngine::from_config(config, &registry, metrics.clone())
        .context("Failed to set up the extraction provider")?;

    let options = RunOptions {
        force_call_tracing: args.force_call_tracing,
    };
    let result = engine.run(&posting, &criteria, options).await;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text(&result),
    }

    let totals = metrics.totals();
    tracing::debug!(
        calls = totals.calls,
        failures = totals.failures,
        tokens = totals.total_tokens(),
        estimated_cost = totals.estimated_cost,
        "LLM usage"
    );

    Ok(())
}

fn print_text(result: &EvaluationResult) {
    let recommendation = result
        .recommendation
        .map(|r| r.as_str())
        .unwrap_or("NONE");

    println!("Recommendation: {}", recommendation);
    println!("Reasoning: {}", result.reasoning);

    if let Some(info) = &result.extracted_info {
        println!("Extracted: {}", info.summary());
    }

    if !result.evaluation_result.is_empty() {
        println!("Criteria ({}/{} passed):", result.passed, result.total);
        for verdict in &result.evaluation_result {
            println!(
                "  [{}] {}: {}",
                if verdict.passed { "PASS" } else { "FAIL" },
                verdict.criterion,
                verdict.reasoning
            );
        }
    }

    if let Some(error) = &result.error {
        println!("Error: {}", error);
    }

    println!("Run: {} (workflow {})", result.run_id, result.workflow_version);
}

fn check(config: &AppConfig) -> Result<()> {
    let mut ready = true;
    let registry = ProviderRegistry::with_defaults();
    let profile = &config.extraction;

    println!("Providers available: {}", registry.available_types().join(", "));
    match registry.validate(&profile.provider, &profile.settings) {
        Ok(()) => println!(
            "Extraction provider: {} ({}) ready",
            profile.provider, profile.model
        ),
        Err(e) => {
            ready = false;
            println!("Extraction provider: {} NOT READY: {}", profile.provider, e);
        }
    }

    match TracingSettings::from_config(&config.tracing) {
        Ok(settings) => match settings.inactive_reason() {
            None => println!("Tracing: active ({})", settings.host),
            Some(reason) => println!("Tracing: inactive ({})", reason),
        },
        Err(e) => {
            ready = false;
            println!("Tracing: misconfigured: {}", e);
        }
    }

    let criteria = &config.criteria;
    println!(
        "Criteria: min_salary={}, remote_required={}, ic_title_requirements=[{}]",
        criteria.min_salary,
        criteria.remote_required,
        criteria.ic_title_requirements.join(", ")
    );

    if !ready {
        bail!("Environment check failed");
    }
    Ok(())
}
