//! JSON export of the loaded articles.
//!
//! Files are organized by date, one file per office/ordering combination:
//! ```text
//! json_output_dir/
//! └── 2017-07-17/
//!     └── uk-newest.json
//! ```
//! A later run with the same filters on the same day overwrites the file.

use super::{export_stem, unique_articles};
use crate::models::NewsArticle;
use crate::query::SearchQuery;
use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// The exported document.
#[derive(Debug, Serialize)]
pub struct FeedExport<'a> {
    /// The date of the export in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the export in `HH:MM:SS` format.
    pub local_time: String,
    /// The filters the articles were fetched with.
    pub query: &'a SearchQuery,
    /// The loaded articles, duplicates removed.
    pub articles: Vec<&'a NewsArticle>,
}

impl<'a> FeedExport<'a> {
    pub fn new(articles: &'a [NewsArticle], query: &'a SearchQuery) -> Self {
        let now = Local::now();
        Self {
            local_date: now.date_naive().to_string(),
            local_time: now.time().format("%H:%M:%S").to_string(),
            query,
            articles: unique_articles(articles),
        }
    }
}

/// Write `articles` to `{json_output_dir}/{date}/{office}-{order}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_export(
    articles: &[NewsArticle],
    query: &SearchQuery,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let export = FeedExport::new(articles, query);
    let json = serde_json::to_string_pretty(&export)?;

    let full_json_dir = PathBuf::from(json_output_dir).join(&export.local_date);
    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = full_json_dir.join(format!("{}.json", export_stem(query)));
    fs::write(&path, json).await?;
    info!(path = %path.display(), count = export.articles.len(), "Wrote JSON export");

    Ok(path)
}
