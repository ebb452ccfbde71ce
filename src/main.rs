//! # sitesearch CLI
//!
//! Command-line front end of the search engine:
//!
//! - `crawl`: crawl every configured site and rebuild its index
//! - `index-page`: re-index one page of a configured site
//! - `search`: ranked full-text search over the index
//! - `stats`: index statistics per site
//! - `serve`: HTTP API over the same operations

mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sitesearch::config::AppConfig;
use sitesearch::crawler::RunState;
use sitesearch::search::{SearchOptions, SearchResponse};
use sitesearch::service::{SearchEngineService, Statistics};
use tracing::{info, instrument};

#[derive(Parser)]
#[command(author, version, about = "Crawl websites and search them by word lemmas", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "SITESEARCH_CONFIG",
        default_value = "searchengine.json"
    )]
    config: PathBuf,

    /// Index database, overrides the configured path
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl all configured sites and rebuild their index
    Crawl,

    /// Re-index a single page of a configured site
    IndexPage(IndexPageArgs),

    /// Search the index
    Search(SearchArgs),

    /// Show index statistics
    Stats(StatsArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct IndexPageArgs {
    /// Page URL
    #[arg(required = true)]
    url: String,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Search query
    #[arg(required = true)]
    query: String,

    /// Restrict results to the site with this root URL
    #[arg(short, long)]
    site: Option<String>,

    /// Number of results to skip
    #[arg(short, long, default_value = "0")]
    offset: usize,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    limit: usize,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Output format (text or json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Directory of the server log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let _ = Cli::parse_from(["sitesearch", "--help"]);
        return Ok(());
    };

    let log_dir = match &command {
        Commands::Serve(args) => Some(args.log_dir.as_path()),
        _ => None,
    };
    let _otel = telemetry::init_tracing_subscriber(log_dir)?;

    let mut config = AppConfig::read_config(&cli.config)
        .await
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    let service = SearchEngineService::new(config).await?;

    match command {
        Commands::Crawl => crawl_command(&service).await?,
        Commands::IndexPage(args) => index_page_command(&service, args).await?,
        Commands::Search(args) => search_command(&service, args).await?,
        Commands::Stats(args) => stats_command(&service, args).await?,
        Commands::Serve(args) => serve_command(service, args).await?,
    }

    Ok(())
}

async fn current_statistics(service: &SearchEngineService) -> anyhow::Result<Statistics> {
    let response = service.statistics().await?;
    response
        .payload
        .map(|payload| payload.statistics)
        .ok_or_else(|| anyhow!(response.error.unwrap_or_default()))
}

#[instrument(skip(service))]
async fn crawl_command(service: &SearchEngineService) -> anyhow::Result<()> {
    let started = service.start_indexing().await?;
    if let Some(error) = started.error {
        return Err(anyhow!(error));
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Crawling...");

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut stopping = false;
    let finished = service.scheduler().wait();
    tokio::pin!(finished);

    let state = loop {
        tokio::select! {
            state = &mut finished => break state,
            _ = tokio::signal::ctrl_c(), if !stopping => {
                stopping = true;
                spinner.set_message("Stopping...");
                service.stop_indexing().await?;
            }
            _ = ticker.tick() => {
                let statistics = current_statistics(service).await?;
                spinner.set_message(format!("{} pages indexed", statistics.total.pages));
            }
        }
    };
    spinner.finish_and_clear();

    match state {
        RunState::Completed => println!("Crawl completed"),
        RunState::Stopped => println!("Crawl stopped"),
        _ => println!("Crawl failed"),
    }

    let statistics = current_statistics(service).await?;
    for site in &statistics.detailed {
        let status = site.status.map(|s| s.to_string()).unwrap_or_default();
        println!(
            "{} ({}): {} - {} pages, {} lemmas",
            site.name, site.url, status, site.pages, site.lemmas
        );
        if let Some(error) = &site.error {
            println!("   Error: {}", error);
        }
    }

    if state == RunState::Failed {
        return Err(anyhow!("crawl run failed"));
    }
    Ok(())
}

#[instrument(skip(service))]
async fn index_page_command(service: &SearchEngineService, args: IndexPageArgs) -> anyhow::Result<()> {
    let response = service.index_page(&args.url).await?;
    match response.error {
        Some(error) => Err(anyhow!(error)),
        None => {
            println!("Indexed {}", args.url);
            Ok(())
        }
    }
}

fn print_results(results: &SearchResponse) {
    println!("Found {} results", results.count);
    for (i, result) in results.data.iter().enumerate() {
        println!("{}. {} ({:.3})", i + 1, result.title, result.relevance);
        println!("   URL: {}{}", result.site, result.uri);
        println!("   {}", result.snippet);
        println!();
    }
}

#[instrument(skip(service))]
async fn search_command(service: &SearchEngineService, args: SearchArgs) -> anyhow::Result<()> {
    let options = SearchOptions {
        site: args.site,
        offset: args.offset,
        limit: args.limit,
    };
    let response = service.search(&args.query, &options).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match (response.payload, response.error) {
        (Some(results), _) => print_results(&results),
        (None, error) => return Err(anyhow!(error.unwrap_or_default())),
    }
    Ok(())
}

#[instrument(skip(service))]
async fn stats_command(service: &SearchEngineService, args: StatsArgs) -> anyhow::Result<()> {
    if args.format == "json" {
        let response = service.statistics().await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let statistics = current_statistics(service).await?;
    println!(
        "Sites: {}, pages: {}, lemmas: {}{}",
        statistics.total.sites,
        statistics.total.pages,
        statistics.total.lemmas,
        if statistics.total.indexing {
            " (indexing)"
        } else {
            ""
        }
    );

    for site in &statistics.detailed {
        println!();
        println!("{} - {}", site.name, site.url);
        match (site.status, site.status_time) {
            (Some(status), Some(time)) => {
                let time = chrono::DateTime::from_timestamp(time, 0)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!("Status: {} ({})", status, time);
            }
            _ => println!("Status: not indexed"),
        }
        println!("Pages: {}", site.pages);
        println!("Lemmas: {}", site.lemmas);
        if let Some(error) = &site.error {
            println!("Error: {}", error);
        }
    }

    Ok(())
}

async fn serve_command(service: SearchEngineService, args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting server with {} sites", service.config().sites.len());
    sitesearch::server::serve(Arc::new(service), args.bind).await?;
    Ok(())
}
