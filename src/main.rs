//! # News Crawler
//!
//! Command-line entry point. Parses arguments, builds the configuration,
//! opens the shared transport session and dispatches one subcommand. Results
//! are printed as JSON on stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```sh
//! news_crawler crawl https://www.bbc.com/news/articles/example
//! news_crawler discover https://feeds.bbci.co.uk/news/rss.xml --max-articles 3
//! RUST_LOG=debug news_crawler serve
//! ```

use clap::Parser;
use news_crawler::cli::{Cli, Command};
use news_crawler::models::{CrawlTarget, SearchQuery};
use news_crawler::{NewsCrawler, Session, server, tools};
use serde::Serialize;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a crawl-level error as a failure envelope keyed by `url`.
fn print_failure(url: &str, e: &news_crawler::CrawlError) -> Result<(), Box<dyn Error>> {
    error!(%url, error = %e, "Request failed");
    print_json(&news_crawler::models::ArticleResult::failure(url, e))
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(command = ?args.command, config = ?args.config, "Parsed CLI arguments");

    if args.command == Command::Tools {
        return print_json(&tools::tool_definitions());
    }

    let config = args.load_config()?;
    info!(
        max_concurrency = config.policy.max_concurrency,
        delay_ms = config.policy.delay_ms,
        timeout_secs = config.session.timeout_secs,
        "Configuration loaded"
    );

    // The session is the only fatal dependency.
    let session = Session::new(config.session.clone());
    if let Err(e) = session.open() {
        error!(error = %e, "Could not open transport session");
        return Err(e.into());
    }
    let crawler = NewsCrawler::new(&session, config);

    let outcome = run(&crawler, args.command).await;
    session.close();

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "Execution complete");
    outcome
}

async fn run(crawler: &NewsCrawler<'_, Session>, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Crawl { url, language } => {
            let target = CrawlTarget::new(url).with_language(language);
            print_json(&crawler.crawl(&target).await)
        }
        Command::CrawlMany { urls, language } => {
            let targets: Vec<CrawlTarget> = urls
                .into_iter()
                .map(|url| CrawlTarget::new(url).with_language(language.clone()))
                .collect();
            print_json(&crawler.crawl_many(&targets).await)
        }
        Command::Discover {
            rss_url,
            max_articles,
        } => match crawler.discover(&rss_url, max_articles).await {
            Ok(results) => print_json(&results),
            Err(e) => print_failure(&rss_url, &e),
        },
        Command::Search {
            query,
            feeds,
            max_results,
        } => {
            let mut query = SearchQuery::new(query).with_max_results(max_results);
            if !feeds.is_empty() {
                query = query.with_feeds(feeds);
            }
            match crawler.search(&query).await {
                Ok(results) => print_json(&results),
                Err(e) => print_failure("", &e),
            }
        }
        Command::Summarize { url, sentences } => {
            print_json(&crawler.summarize(&CrawlTarget::new(url), sentences).await)
        }
        Command::Serve => Ok(server::serve_stdio(crawler).await?),
        Command::Tools => print_json(&tools::tool_definitions()),
    }
}
