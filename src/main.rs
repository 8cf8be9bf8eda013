use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

use driftbench::capability::{
    DryRunEvaluator, DryRunTransformer, Evaluator, GeminiConfig, GeminiEvaluator,
};
use driftbench::domain::{ItemStatus, Modality, Payload, SeedItem};
use driftbench::run::{Runner, RunSummary, SUMMARY_FILE};
use driftbench::signal::AbortFlag;
use driftbench::store::ArtifactStore;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("driftbench")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("driftbench.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Discover seed files in the input directory; item id = file stem
fn collect_seeds(input_dir: &Path, modality: Modality) -> Result<Vec<SeedItem>> {
    let patterns: &[&str] = match modality {
        Modality::Image => &["*.png", "*.jpg", "*.jpeg"],
        Modality::Text => &["*.txt"],
    };

    let mut seeds = Vec::new();
    for pattern in patterns {
        let full = format!("{}/{}", input_dir.display(), pattern);
        for entry in glob::glob(&full).context("Invalid seed glob pattern")? {
            let path = entry.context("Failed to read seed directory entry")?;
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let payload = match modality {
                Modality::Image => Payload::Image(
                    fs::read(&path).context(format!("Failed to read seed {}", path.display()))?,
                ),
                Modality::Text => Payload::Text(
                    fs::read_to_string(&path)
                        .context(format!("Failed to read seed {}", path.display()))?,
                ),
            };
            seeds.push(SeedItem::new(stem, payload));
        }
    }
    seeds.sort_by(|a, b| a.id.cmp(&b.id));

    eyre::ensure!(
        !seeds.is_empty(),
        "No {} seeds found in {}",
        modality,
        input_dir.display()
    );
    Ok(seeds)
}

/// Abort flag wired to Ctrl-C: first press stops new capability calls
fn abort_on_ctrl_c() -> AbortFlag {
    let abort = AbortFlag::new();
    let flag = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Abort requested, draining in-flight calls...".yellow());
            flag.trigger();
        }
    });
    abort
}

fn open_store(config: &Config) -> Result<Arc<ArtifactStore>> {
    let dir = config.output_dir();
    let store = ArtifactStore::open(&dir)
        .context(format!("Failed to open artifact store at {}", dir.display()))?;
    Ok(Arc::new(store))
}

fn save_config_snapshot(config: &Config) -> Result<()> {
    if !config.logging.save_config_snapshot {
        return Ok(());
    }
    let snapshot = serde_yaml::to_string(config).context("Failed to serialize config snapshot")?;
    let path = config.output_dir().join("config_snapshot.yml");
    fs::write(&path, snapshot).context("Failed to write config snapshot")?;
    info!("Config snapshot saved to {}", path.display());
    Ok(())
}

/// Pick the judge backend: Gemini when a key is configured, otherwise the
/// placeholder rater
fn make_evaluator(config: &Config) -> Result<Arc<dyn Evaluator>> {
    if std::env::var("GOOGLE_API_KEY").is_ok() {
        let gemini = GeminiEvaluator::new(GeminiConfig::with_model(config.evaluation.model.clone()))
            .context("Failed to build Gemini evaluator")?;
        Ok(Arc::new(gemini))
    } else {
        log::warn!("GOOGLE_API_KEY not set, using placeholder ratings");
        println!(
            "{}",
            "GOOGLE_API_KEY not set - ratings will be placeholders".yellow()
        );
        Ok(Arc::new(DryRunEvaluator::new()))
    }
}

async fn handle_run(config: &Config) -> Result<()> {
    let ctx = Arc::new(config.run_context()?);
    let store = open_store(config)?;
    save_config_snapshot(config)?;

    let seeds = collect_seeds(&config.experiment.input_dir, ctx.spec.seed_modality())?;
    println!(
        "{} {} items, pattern {}, {} iterations",
        "Running:".green(),
        seeds.len(),
        ctx.spec.pattern_string(),
        ctx.spec.iterations()
    );

    let runner = Runner::new(
        Arc::new(DryRunTransformer::new()),
        make_evaluator(config)?,
        store,
        ctx,
    );
    let summary = runner.run_full(seeds, &abort_on_ctrl_c()).await?;
    print_summary(&summary);
    Ok(())
}

async fn handle_evaluate(config: &Config) -> Result<()> {
    let ctx = Arc::new(config.run_context()?);
    let store = open_store(config)?;
    println!(
        "{} artifact store at {}",
        "Evaluating:".green(),
        store.root().display()
    );

    let runner = Runner::new(
        Arc::new(DryRunTransformer::new()),
        make_evaluator(config)?,
        store,
        ctx,
    );
    let summary = runner.run_evaluate_only(&abort_on_ctrl_c()).await?;
    print_summary(&summary);
    Ok(())
}

fn handle_report(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let summary: RunSummary = store.read_json(SUMMARY_FILE).context(format!(
        "No run summary in {}; run `driftbench run` first",
        store.root().display()
    ))?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "{} {} (pattern {}, {} iterations)",
        "Run:".bold(),
        summary.run_id,
        summary.pattern,
        summary.iterations
    );
    for item in &summary.items {
        let status = match item.loop_status {
            ItemStatus::Completed => "completed".green(),
            ItemStatus::Failed => "failed".red(),
            ItemStatus::Aborted => "aborted".yellow(),
        };
        let mut line = format!(
            "  {:<20} {:<10} {} scored, {} unscored",
            item.item_id, status, item.scored, item.unscored
        );
        if item.pending > 0 {
            line.push_str(&format!(", {} pending", item.pending));
        }
        println!("{}", line);
    }
    let (scored, unscored) = summary.pair_totals();
    println!(
        "{} {}/{} items completed, {} pairs scored, {} unscored",
        "Total:".bold(),
        summary.completed_items(),
        summary.items.len(),
        scored,
        unscored
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }
    info!("Starting with config from: {:?}", cli.config);

    match &cli.command {
        None | Some(Commands::Run) => handle_run(&config).await.context("Run failed"),
        Some(Commands::Evaluate) => handle_evaluate(&config).await.context("Evaluation failed"),
        Some(Commands::Report) => handle_report(&config).context("Report failed"),
    }
}
