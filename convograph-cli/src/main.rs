mod config;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use convograph::pipeline::{BarProgress, LogProgress};
use convograph::{
    resolve, ConversationSummary, Episode, EpisodeBuilder, IngestError, IngestReport,
    IngestionDriver, Neo4jConnector, ResolvedBackend,
};

use crate::config::{AppConfig, DEFAULT_CONFIG_PATH};

/// Ingest chat-export conversation summaries into a Neo4j knowledge graph.
#[derive(Debug, Parser)]
#[command(name = "convograph", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build episodes from the summary and submit them to the graph store.
    Ingest(IngestArgs),
    /// Build episodes and print them as JSON without connecting anywhere.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct IngestArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Summary file; defaults to `<output_folder>/conversation_summary.json`.
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Fail on conversations without a parseable timestamp.
    #[arg(long)]
    strict_timestamps: bool,

    /// Log each episode instead of drawing a progress bar.
    #[arg(long)]
    no_progress: bool,
}

#[derive(Debug, Args)]
struct InspectArgs {
    #[arg(long)]
    summary: PathBuf,

    #[arg(long)]
    strict_timestamps: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ───────────────────────────────────────────────────────────────
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("convograph=info".parse()?);
    if cli.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Command::Ingest(args) => ingest(args, cli.json).await,
        Command::Inspect(args) => inspect(args),
    }
}

async fn ingest(args: IngestArgs, json_logs: bool) -> anyhow::Result<()> {
    // ── Config ────────────────────────────────────────────────────────────────
    let config = AppConfig::load(&args.config).map_err(|e| {
        error!("Configuration error: {:#}", e);
        e
    })?;

    let ResolvedBackend { connection, bundle } =
        resolve(&config.model_config, config.neo4j.clone()).map_err(|e| {
            let e = IngestError::from(e);
            error!(phase = %e.phase(), "{}", e);
            e
        })?;

    // ── Episodes ──────────────────────────────────────────────────────────────
    let summary_path = args.summary.unwrap_or_else(|| config.summary_path());
    let episodes = build_episodes(
        &summary_path,
        args.strict_timestamps || config.strict_timestamps,
    )?;

    info!(
        summary = %summary_path.display(),
        episodes = episodes.len(),
        uri = %connection.uri,
        "starting ingestion"
    );

    // ── Ingestion ─────────────────────────────────────────────────────────────
    let driver = IngestionDriver::new(Neo4jConnector);
    let outcome = if args.no_progress || json_logs {
        driver
            .run(&connection, bundle, &episodes, &mut LogProgress)
            .await
    } else {
        driver
            .run(&connection, bundle, &episodes, &mut BarProgress::new())
            .await
    };

    report(outcome)
}

fn inspect(args: InspectArgs) -> anyhow::Result<()> {
    let episodes = build_episodes(&args.summary, args.strict_timestamps)?;
    println!("{}", serde_json::to_string_pretty(&episodes)?);
    Ok(())
}

fn build_episodes(path: &Path, strict: bool) -> anyhow::Result<Vec<Episode>> {
    let summary = ConversationSummary::from_path(path).map_err(|e| {
        error!("{}", e);
        e
    })?;
    let built = EpisodeBuilder::new().strict(strict).build(&summary)?;
    Ok(built.episodes)
}

fn report(outcome: Result<IngestReport, IngestError>) -> anyhow::Result<()> {
    match outcome {
        Ok(report) => {
            info!(
                submitted = report.submitted,
                total = report.total,
                "ingestion complete"
            );
            Ok(())
        }
        Err(e) => {
            let (phase, committed) = (e.phase(), e.committed());
            let e = anyhow::Error::from(e);
            error!(%phase, committed, "ingestion failed: {:#}", e);
            Err(e)
        }
    }
}
