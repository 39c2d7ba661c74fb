//! Command-line interface definitions for Guardian News.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option is optional: unset flags fall back to the YAML preferences
//! file (when given) and then to built-in defaults. The API key and base URL
//! can also come from the environment.

use crate::query::{DateRange, OrderBy, ProductionOffice};
use clap::Parser;

/// Command-line arguments for the Guardian News reader.
///
/// # Examples
///
/// ```sh
/// # Today's UK stories, newest first
/// guardian_news
///
/// # A week of US stories, five pages, exported to JSON and Markdown
/// guardian_news --from-date last-week -o us -p 5 -j ./json -m ./markdown
///
/// # Page through interactively and remember where you stopped
/// guardian_news -i --state-file ~/.guardian_news.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a preferences YAML file
    #[arg(short, long)]
    pub config: Option<String>,

    /// How far back to search
    #[arg(long, value_enum)]
    pub from_date: Option<DateRange>,

    /// Result ordering
    #[arg(long, value_enum)]
    pub order_by: Option<OrderBy>,

    /// Production office that published the stories
    #[arg(short = 'o', long, value_enum)]
    pub production_office: Option<ProductionOffice>,

    /// Results requested per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Content API key
    #[arg(long, env = "GUARDIAN_API_KEY")]
    pub api_key: Option<String>,

    /// Search endpoint
    #[arg(long, env = "GUARDIAN_API_URL")]
    pub base_url: Option<String>,

    /// Articles shown per screen
    #[arg(short = 'n', long)]
    pub visible_items: Option<usize>,

    /// Remaining articles below the screen that trigger the next page
    #[arg(long)]
    pub threshold: Option<usize>,

    /// Stop after this many pages (0 means no limit)
    #[arg(short = 'p', long)]
    pub max_pages: Option<u32>,

    /// Retries for a failed page request
    #[arg(long)]
    pub retries: Option<usize>,

    /// Wait for Enter between screens
    #[arg(short, long)]
    pub interactive: bool,

    /// Save the session here on exit and resume from it on start
    #[arg(long)]
    pub state_file: Option<String>,

    /// Output directory for a JSON export of the loaded articles
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for a Markdown export of the loaded articles
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,
}
