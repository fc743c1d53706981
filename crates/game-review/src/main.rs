//! Game review CLI
//!
//! Scores every move of finished games with a local Stockfish and prints a
//! JSON review per game: per-side statistics and critical moments.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use chess_core::parse_pgn;
use game_review::config::ReviewConfig;
use game_review::{review_game, GameReview};

#[derive(Parser, Debug)]
#[command(name = "game-review", version, about = "Move-quality review of finished chess games")]
struct Args {
    /// PGN files to review. A directory stands for its most recently modified .pgn
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Tracked player; enables the "your stats" summary
    #[arg(short, long)]
    username: Option<String>,

    /// Engine search depth per position
    #[arg(short, long)]
    depth: Option<u32>,

    /// Path to the Stockfish binary
    #[arg(long)]
    stockfish: Option<String>,

    /// Write <name>.review.json files here instead of printing to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Games analyzed concurrently (one engine each)
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = ReviewConfig::load()?;
    if let Some(username) = args.username {
        config.username = Some(username);
    }
    if let Some(depth) = args.depth {
        anyhow::ensure!(depth > 0, "--depth must be at least 1");
        config.settings.depth = depth;
    }
    if let Some(path) = args.stockfish {
        config.engine.path = path;
    }
    info!(
        stockfish_path = %config.engine.path,
        depth = config.settings.depth,
        "Review config loaded"
    );

    let mut pgn_paths = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        pgn_paths.push(resolve_input(input)?);
    }

    if let Some(dir) = &args.output {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    let num_workers = args.jobs.unwrap_or_else(num_cpus::get).max(1);
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let config = Arc::new(config);
    info!(games = pgn_paths.len(), num_workers, "Starting reviews");

    let mut handles = Vec::with_capacity(pgn_paths.len());
    for path in pgn_paths {
        let permit = semaphore.clone().acquire_owned().await?;
        let config = config.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permit; // Hold until done
            let review = review_file(&config, &path).await;
            (path, review)
        }));
    }

    let mut failed = 0usize;
    for handle in handles {
        let (path, review) = handle.await?;
        match review {
            Ok(review) => write_review(args.output.as_deref(), &path, &review).await?,
            Err(e) => {
                error!(file = %path.display(), error = %format!("{e:#}"), "Review failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} game(s) could not be reviewed");
    }
    Ok(())
}

async fn review_file(config: &ReviewConfig, path: &Path) -> anyhow::Result<GameReview> {
    let pgn = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let game = parse_pgn(&pgn)?;
    if game.moves.is_empty() {
        warn!(file = %path.display(), "Game has no moves");
    }
    Ok(review_game(config, &game).await?)
}

/// A file is used as-is; a directory resolves to its newest .pgn
fn resolve_input(input: &Path) -> anyhow::Result<PathBuf> {
    if !input.is_dir() {
        return Ok(input.to_path_buf());
    }

    let pattern = format!("{}/*.pgn", input.display());
    let latest = glob::glob(&pattern)?
        .filter_map(|p| p.ok())
        .filter_map(|p| {
            let modified = p.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, p))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, p)| p);

    latest.with_context(|| format!("no .pgn files found in {}", input.display()))
}

async fn write_review(output: Option<&Path>, source: &Path, review: &GameReview) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(review)?;
    match output {
        None => println!("{json}"),
        Some(dir) => {
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "game".to_string());
            let target = dir.join(format!("{stem}.review.json"));
            tokio::fs::write(&target, json)
                .await
                .with_context(|| format!("writing {}", target.display()))?;
            info!(file = %target.display(), "Review written");
        }
    }
    Ok(())
}
