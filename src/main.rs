//! # Guardian News
//!
//! A terminal reader for the Guardian content search API. It queries the
//! API with the reader's filters (date range, ordering, production office),
//! shows the results a screen at a time and loads further pages on demand as
//! the reader approaches the end of the list.
//!
//! ## Usage
//!
//! ```sh
//! guardian_news --from-date last-week -o us -i
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: defaults, optional YAML preferences, CLI flags
//! 2. **First page**: fetched directly once the network is reachable
//! 3. **Scrolling**: every screen is reported to the infinite-scroll state
//!    machine, which requests the next page when few items remain below
//! 4. **Output**: optional session snapshot, JSON export and Markdown digest

use clap::Parser;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod feed;
mod models;
mod outputs;
mod pagination;
mod parser;
mod query;
mod render;
mod session;
mod utils;

use api::{ArticleSource, GuardianClient, RetryFetch};
use cli::Cli;
use config::Config;
use feed::{Feed, ScrollEvent};
use outputs::{json, markdown};
use pagination::{Connectivity, TcpProbe};
use render::render_screen;
use utils::ensure_writable_dir;

/// Time allowed for the reachability probe's TCP connect.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
/// First delay between retries of a failed page request.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("guardian_news starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, interactive = args.interactive, state_file = ?args.state_file, "Parsed CLI arguments");

    let config = Config::resolve(&args)?;
    let query = config.search_query()?;
    info!(
        from_date = %query.from_date,
        order_by = %query.order_by,
        production_office = %query.production_office,
        page_size = query.page_size,
        "Search configured"
    );

    // Early check: export directories must be writable before any fetching
    for dir in [&args.json_output_dir, &args.markdown_output_dir]
        .into_iter()
        .flatten()
    {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let probe = TcpProbe::for_url(query.base_url(), PROBE_TIMEOUT)
        .ok_or("search URL has no host to connect to")?;
    let client = RetryFetch::new(GuardianClient::new()?, config.api.retries, RETRY_BASE_DELAY);

    let state_path = args.state_file.as_deref().map(PathBuf::from);
    let snapshot = match &state_path {
        Some(path) => match session::load(path, &query).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read saved session; starting fresh");
                None
            }
        },
        None => None,
    };

    let mut feed = match snapshot {
        Some(snapshot) => Feed::restore(client, query, probe, &config.feed, snapshot),
        None => {
            if !probe.is_connected() {
                println!("No internet connection.");
                return Ok(());
            }
            let mut feed = Feed::new(client, query, probe, &config.feed);
            feed.start().await;
            feed
        }
    };

    if feed.articles().is_empty() {
        println!("No articles found.");
    } else {
        read_feed(&mut feed, args.interactive).await?;
    }

    if let Some(path) = &state_path {
        if let Err(e) = session::save(&feed.snapshot(), path).await {
            error!(path = %path.display(), error = %e, "Failed to save session");
        }
    }

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_export(feed.articles(), feed.query(), dir).await {
            error!(error = %e, "Failed to write JSON export");
        }
    }

    if let Some(dir) = &args.markdown_output_dir {
        if let Err(e) = markdown::write_digest(feed.articles(), feed.query(), dir).await {
            error!(error = %e, "Failed to write Markdown digest");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = feed.articles().len(),
        pages = feed.page_in_query(),
        "Execution complete"
    );
    Ok(())
}

/// Show the feed screen by screen until the end of the list (or `q` in
/// interactive mode).
async fn read_feed<S, C>(feed: &mut Feed<S, C>, interactive: bool) -> Result<(), Box<dyn Error>>
where
    S: ArticleSource,
    C: Connectivity,
{
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut offline_noticed = false;

    loop {
        render_screen(&mut io::stdout().lock(), feed.first_visible(), feed.visible())?;

        match feed.scroll().await {
            ScrollEvent::Offline if !offline_noticed => {
                println!("No internet connection; showing loaded articles only.\n");
                offline_noticed = true;
            }
            ScrollEvent::Loaded { page, count } => {
                debug!(page, count, "Loaded more articles while scrolling");
                offline_noticed = false;
            }
            _ => {}
        }

        if !feed.advance() {
            println!("End of list ({} articles).", feed.articles().len());
            break;
        }

        if interactive {
            print!("-- more (Enter to continue, q to quit) --");
            io::stdout().flush()?;
            match input.next_line().await? {
                Some(line) if line.trim().eq_ignore_ascii_case("q") => break,
                None => break,
                Some(_) => {}
            }
        }
    }
    Ok(())
}
