use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use admetrics_core::{outputs, pipeline, verification, Platform};
use admetrics_insights::{summary, DateRange, InsightsGenerator};

#[derive(Parser, Debug)]
#[command(author, version, about = "Marketing analytics pipeline and insights CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline and write the processed CSV artifacts
    Process(ProcessArgs),
    /// Report shape, columns, and date coverage of the source files
    Verify(VerifyArgs),
    /// Narrate the processed numbers, locally when no remote model is configured
    Summarize(SummarizeArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Directory containing Facebook.csv, Google.csv, TikTok.csv, business.csv
    #[arg(long, default_value = "Data")]
    data_dir: PathBuf,
    /// Directory the processed artifacts are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[arg(long, default_value = "Data")]
    data_dir: PathBuf,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    #[arg(long, default_value = "Data")]
    data_dir: PathBuf,
    /// First day of the reporting window (defaults to the earliest business date)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day of the reporting window (defaults to the latest business date)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Restrict the platform analysis to these platforms
    #[arg(long, value_parser = parse_platform)]
    platform: Vec<Platform>,
    /// Free-text question answered against the filtered numbers
    #[arg(long)]
    question: Option<String>,
    #[arg(long, value_enum, default_value_t = SummaryMode::Summary)]
    mode: SummaryMode,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryMode {
    Summary,
    Trends,
    Platforms,
}

fn parse_platform(value: &str) -> Result<Platform, String> {
    Platform::try_from(value)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Process(args) => run_process(args),
        Command::Verify(args) => run_verify(args),
        Command::Summarize(args) => run_summarize(args),
    }
}

fn run_process(args: ProcessArgs) -> Result<()> {
    let sources = load_sources(&args.data_dir)?;
    let output = pipeline::run(&sources)?;
    let artifacts = outputs::write_artifacts(&args.out_dir, &output)?;

    info!(
        joined_rows = output.summary.joined_rows,
        marketing_rows = output.summary.aggregated_rows,
        business = %artifacts.business_path.display(),
        marketing = %artifacts.marketing_path.display(),
        "pipeline run complete"
    );
    Ok(())
}

fn run_verify(args: VerifyArgs) -> Result<()> {
    for (file, report) in verification::verify_data_dir(&args.data_dir) {
        match report {
            Ok(report) => {
                let mut table = Table::new();
                table.set_header(vec!["property", "value"]);
                table.add_row(vec!["rows".to_string(), report.rows.to_string()]);
                table.add_row(vec!["columns".to_string(), report.columns.join(", ")]);
                if let Some((min, max)) = &report.date_range {
                    table.add_row(vec!["date range".to_string(), format!("{min} to {max}")]);
                }
                if !report.tactics.is_empty() {
                    table.add_row(vec!["tactics".to_string(), report.tactics.join(", ")]);
                }
                if !report.states.is_empty() {
                    table.add_row(vec!["states".to_string(), report.states.join(", ")]);
                }
                println!("{file}:\n{table}\n");
            }
            Err(err) => {
                warn!(file = file.as_str(), error = %err, "source file could not be inspected");
                println!("{file}: error: {err}\n");
            }
        }
    }
    Ok(())
}

fn run_summarize(args: SummarizeArgs) -> Result<()> {
    let sources = load_sources(&args.data_dir)?;
    let output = pipeline::run(&sources)?;
    let range = resolve_range(&output.joined, args.from, args.to)?;
    let generator = InsightsGenerator::from_env();

    let text = if let Some(question) = args.question.as_deref() {
        generator.answer_question(question, &output.joined, &output.marketing, range)?
    } else {
        match args.mode {
            SummaryMode::Summary => {
                generator.performance_summary(&output.joined, &output.marketing, range)?
            }
            SummaryMode::Trends => generator.trend_analysis(&output.joined, range)?,
            SummaryMode::Platforms => {
                generator.platform_recommendations(&output.marketing, range, &args.platform)?
            }
        }
    };

    println!("{text}");
    Ok(())
}

fn load_sources(data_dir: &std::path::Path) -> Result<pipeline::RawSources> {
    pipeline::RawSources::load_from_dir(data_dir)
        .with_context(|| format!("failed to read source files from {}", data_dir.display()))
}

fn resolve_range(
    joined: &polars::prelude::DataFrame,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<DateRange> {
    let span = summary::date_span(joined)?;
    let Some((min, max)) = span else {
        bail!("no business dates available to summarize")
    };
    Ok(DateRange::new(from.unwrap_or(min), to.unwrap_or(max))?)
}
