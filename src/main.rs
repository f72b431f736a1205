use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use meti_news::app::{App, AppEvent};
use meti_news::config::Config;
use meti_news::feed::FeedFetcher;
use meti_news::news::{FilterMode, NewsService};
use meti_news::ui;

/// Default config file location (~/.config/meti-news/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("meti-news")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "meti-news",
    about = "METI press releases and Google News search results in one feed"
)]
struct Args {
    /// Search text for the news search source
    #[arg(long, short)]
    query: Option<String>,

    /// Which sources to include
    #[arg(long, short, value_enum)]
    filter: Option<FilterMode>,

    /// Print news cards to stdout instead of starting the dashboard
    #[arg(long, conflicts_with = "json")]
    plain: bool,

    /// Print the merged records as JSON
    #[arg(long)]
    json: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout belongs to the dashboard and to --plain/--json output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let query = args
        .query
        .unwrap_or_else(|| config.default_query.clone())
        .trim()
        .to_string();
    let filter = args.filter.unwrap_or(config.default_filter);

    let fetcher =
        FeedFetcher::new(&config.fetch_settings()).context("Failed to build HTTP client")?;
    let service = Arc::new(NewsService::new(fetcher, config.service_settings()));

    if args.plain || args.json {
        let requests = service.requests(filter, &query);
        let aggregation = service.aggregate(&requests).await;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        if args.json {
            for outcome in &aggregation.outcomes {
                eprintln!("{}", ui::outcome_line(outcome));
            }
            ui::write_json(&mut out, &aggregation.records).context("Failed to write JSON")?;
        } else {
            ui::write_plain(&mut out, &aggregation, config.summary_max_chars)
                .context("Failed to write news cards")?;
        }
        out.flush()?;
        return Ok(());
    }

    let mut app = App::new(service, query, filter, config.summary_max_chars);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, event_tx, event_rx).await?;
    Ok(())
}
