use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use youtube_stat_rust::{Config, Pipeline};

#[derive(Parser)]
#[command(name = "youtube-stat")]
#[command(about = "Crawl a YouTube channel and compile title features for regression")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to youtube-stat.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Channel to process
    #[arg(long, global = true)]
    channel_id: Option<String>,

    /// Directory holding `working/<channel_id>/`
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Exclude videos published after this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    before_date: Option<NaiveDate>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the channel and fetch missing video details
    Crawl,
    /// Parse titles, build the dataset and encode features
    Pre,
    /// Crawl then preprocess
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| Config::locate(Path::new(".")));
    let mut config = match &config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::load()?,
    };
    if let Some(channel_id) = cli.channel_id {
        config.crawler.channel_id = Some(channel_id);
    }
    if let Some(base_dir) = cli.base_dir {
        config.output.base_dir = base_dir;
    }
    if let Some(before_date) = cli.before_date {
        config.data.before_date = Some(before_date);
    }

    // Initialize logging
    let level = if cli.verbose {
        "debug"
    } else {
        config.output.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(format!("youtube_stat_rust={},youtube_stat={},warn", level, level))
        .init();

    info!("🚀 YouTube Stat starting...");
    match &config_path {
        Some(path) => info!("📄 Loaded configuration from: {}", path.display()),
        None => info!("📄 No configuration file found, using defaults and environment"),
    }
    info!("{}", config.summary());

    let pipeline = Pipeline::new(config)?;
    let start_time = std::time::Instant::now();

    match cli.command {
        Commands::Crawl => {
            let items = pipeline.crawl().await?;
            info!("📹 {} videos in detail cache", items.len());
        }
        Commands::Pre => {
            let matrix = pipeline.preprocess().await?;
            info!("📊 {} rows written to {}", matrix.len(), pipeline.store().training_data_path().display());
        }
        Commands::All => {
            let matrix = pipeline.run_all().await?;
            info!("📊 {} rows written to {}", matrix.len(), pipeline.store().training_data_path().display());
        }
    }

    info!("🎉 Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}
