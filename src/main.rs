//! Trend Idea Pipeline: command line entrypoint.
//! Loads `.env` and config, wires the pipeline, runs one subcommand and prints
//! its result as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_idea_pipeline::metrics::Metrics;
use trend_idea_pipeline::{PipelineConfig, TrendPipeline};

#[derive(Parser, Debug)]
#[command(name = "trend-idea-pipeline", version, about = "Turn trend signals into one published app idea per day")]
struct Cli {
    /// Config file (TOML or JSON). Defaults to $PIPELINE_CONFIG_PATH, then config/pipeline.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print Prometheus metrics to stderr after the command.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full daily run: collect, rank, generate, store, publish.
    Run,
    /// Generate one idea from a fixed demo trend.
    Demo,
    /// Show today's published idea.
    Today,
    /// Collect and rank trends only.
    Rank,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_idea_pipeline=info,warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("encoding output")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let recorder = if cli.metrics { Some(Metrics::init()?) } else { None };

    let config = PipelineConfig::load(cli.config.as_deref()).context("loading pipeline config")?;
    let pipeline = TrendPipeline::from_config(config);
    let now = Utc::now();

    match cli.command {
        Command::Run => print_json(&pipeline.run_daily(now).await?)?,
        Command::Demo => print_json(&pipeline.run_quick_demo(now).await)?,
        Command::Today => print_json(&pipeline.todays_idea(now).await?)?,
        Command::Rank => print_json(&pipeline.rank(now).await)?,
    }

    if let Some(m) = recorder {
        eprintln!("{}", m.render());
    }
    Ok(())
}
