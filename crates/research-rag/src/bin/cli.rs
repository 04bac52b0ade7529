//! Research RAG command-line interface
//!
//! Run with: cargo run -p research-rag --bin research-rag -- --help

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use research_rag::analysis::{MetricExtractor, MetricsReport};
use research_rag::generation::{highlight_snippet, query_terms, truncate_snippet};
use research_rag::{load_documents, IndexBuilder, ModelContext, QueryEngine, RagConfig};

#[derive(Parser, Debug)]
#[command(name = "research-rag", version, about = "Ask questions of research papers and extract their metrics")]
struct Cli {
    /// TOML configuration file (defaults to $RAG_CONFIG)
    #[arg(short, long, global = true, env = "RAG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load every page below a directory and print a sample
    Ingest {
        /// Directory of papers (searched recursively)
        #[arg(short, long, default_value = "data/raw")]
        dir: PathBuf,
    },
    /// Build an index over a directory and answer one question
    Ask {
        /// The question
        question: String,

        #[arg(short, long, default_value = "data/raw")]
        dir: PathBuf,

        /// Nodes retrieved (defaults to the configured similarity_top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Extract metrics from every page and print a table
    Extract {
        #[arg(short, long, default_value = "data/raw")]
        dir: PathBuf,

        /// Year for metrics without one (defaults to analytics.fallback_year)
        #[arg(long)]
        fallback_year: Option<i32>,

        /// Write the full report, including Vega-Lite charts, as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Extract metrics from a piece of text
    ExtractText {
        /// Text to analyse
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest { dir } => ingest(&dir),
        Commands::Ask {
            question,
            dir,
            top_k,
        } => ask(&config, &dir, &question, top_k).await,
        Commands::Extract {
            dir,
            fallback_year,
            output,
        } => extract(&config, &dir, fallback_year, output).await,
        Commands::ExtractText { text } => extract_text(&config, &text).await,
    }
}

fn ingest(dir: &Path) -> anyhow::Result<()> {
    let docs = load_documents(dir)?;
    println!(
        "{} Loaded {} document pages from {}",
        style("✓").green(),
        docs.len(),
        dir.display()
    );

    if let Some(first) = docs.first() {
        println!("\n{}", style("--- Sample content from first page ---").bold());
        println!("Metadata: {}", serde_json::to_string(&first.metadata)?);
        println!("Text snippet: {}", truncate_snippet(&first.text, 500));
    }

    Ok(())
}

async fn ask(
    config: &RagConfig,
    dir: &Path,
    question: &str,
    top_k: Option<usize>,
) -> anyhow::Result<()> {
    let docs = load_documents(dir)?;
    let models = ModelContext::from_config(config).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Indexing {} pages...", docs.len()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let index = IndexBuilder::new(models.embedder.clone(), &config.index)
        .build(docs)
        .await?;

    spinner.set_message("Thinking...");
    let response = QueryEngine::new(&index, models.llm.clone())
        .with_top_k(top_k.unwrap_or(config.index.similarity_top_k))
        .query(question)
        .await;
    spinner.finish_and_clear();

    let response = response?;
    if let Some(warning) = &response.warning {
        println!("{} {}", style("⚠").yellow(), warning);
        return Ok(());
    }

    println!("{}\n{}\n", style("Answer:").bold(), response.answer);

    let terms = query_terms(question);
    println!("{}", style("Sources:").bold());
    for source in &response.sources {
        let caption = highlight_snippet(&source.caption(), &terms, |m| {
            style(m).bold().to_string()
        });
        println!(
            "  {} {} {}",
            style(format!("[{:.3}]", source.score)).dim(),
            style(&source.filename).cyan(),
            caption
        );
    }

    Ok(())
}

async fn extract(
    config: &RagConfig,
    dir: &Path,
    fallback_year: Option<i32>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let docs = load_documents(dir)?;
    let models = ModelContext::from_config(config).await?;
    let extractor = MetricExtractor::new(models.llm.clone(), &config.analytics);

    let progress = ProgressBar::new(docs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
            .context("invalid progress template")?
            .progress_chars("=>-"),
    );
    progress.set_message("Analyzing text for data points...");

    let run = extractor
        .extract_all_with_progress(&docs, |done, _| progress.set_position(done as u64))
        .await;
    progress.finish_and_clear();

    let report = MetricsReport::build(run, fallback_year.unwrap_or(config.analytics.fallback_year));
    print_report(&report);

    if let Some(path) = output {
        std::fs::write(&path, serde_json::to_vec_pretty(&report.with_vega_lite())?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

async fn extract_text(config: &RagConfig, text: &str) -> anyhow::Result<()> {
    let models = ModelContext::from_config(config).await?;
    let metrics = MetricExtractor::new(models.llm.clone(), &config.analytics)
        .extract(text)
        .await?;

    if metrics.is_empty() {
        println!("No metrics found.");
    }
    for m in metrics {
        println!(
            "- [{}] {}: {} {}",
            m.year.map(|y| y.to_string()).unwrap_or_else(|| "None".to_string()),
            m.metric_name,
            m.metric_value,
            m.unit.unwrap_or_default()
        );
    }

    Ok(())
}

fn print_report(report: &MetricsReport) {
    for failure in &report.pages_failed {
        println!(
            "{} page {} ({}, page {}): {}",
            style("extraction failed:").red(),
            failure.page,
            failure.filename,
            failure.page_label,
            failure.error
        );
    }

    if let Some(warning) = &report.warning {
        println!("{} {}", style("⚠").yellow(), warning);
        return;
    }

    println!(
        "{} Found {} data points in {} pages\n",
        style("✓").green(),
        report.rows.len(),
        report.pages_processed
    );
    println!(
        "{}",
        style(format!(
            "{:<6} {:<28} {:>12} {:<8} {}",
            "Year", "Metric", "Value", "Unit", "Paper"
        ))
        .bold()
    );
    for row in &report.rows {
        println!(
            "{:<6} {:<28} {:>12} {:<8} {}",
            row.year,
            truncate_snippet(&row.metric, 28),
            row.value,
            row.unit.as_deref().unwrap_or(""),
            row.paper
        );
    }
}
