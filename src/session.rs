//! Saving and restoring a reading session.
//!
//! A [`FeedSnapshot`] captures what is needed to pick up where the reader
//! left off: the loaded articles, the screen position and the last page
//! requested. It is stored as JSON. A snapshot taken for different filters
//! than the current run is ignored.

use crate::models::NewsArticle;
use crate::query::{OrderBy, ProductionOffice, SearchQuery};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedSnapshot {
    /// Index of the first article on screen.
    pub first_visible: usize,
    /// Last page number requested from the API.
    pub page_in_query: u32,
    /// Page count the API reported, if any page reported one.
    #[serde(default)]
    pub last_page: Option<u32>,
    pub from_date: String,
    pub order_by: OrderBy,
    pub production_office: ProductionOffice,
    pub articles: Vec<NewsArticle>,
}

impl FeedSnapshot {
    /// Whether this snapshot was taken for the same filters as `query`.
    pub fn matches(&self, query: &SearchQuery) -> bool {
        self.from_date == query.from_date
            && self.order_by == query.order_by
            && self.production_office == query.production_office
    }
}

/// Write `snapshot` to `path`, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn save(snapshot: &FeedSnapshot, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json).await?;
    info!(
        articles = snapshot.articles.len(),
        page = snapshot.page_in_query,
        "Saved session"
    );
    Ok(())
}

/// Read a snapshot for `query` from `path`.
///
/// A missing file is not an error (`Ok(None)`); neither is a snapshot for
/// other filters, which is logged and skipped.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load(path: &Path, query: &SearchQuery) -> Result<Option<FeedSnapshot>, Box<dyn Error>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).await?;
    let snapshot: FeedSnapshot = serde_json::from_str(&json)?;
    if !snapshot.matches(query) {
        warn!("Saved session was for different filters; starting fresh");
        return Ok(None);
    }
    if snapshot.articles.is_empty() || snapshot.page_in_query == 0 {
        info!("Saved session is empty; starting fresh");
        return Ok(None);
    }
    info!(
        articles = snapshot.articles.len(),
        page = snapshot.page_in_query,
        "Restored session"
    );
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{DEFAULT_BASE_URL, DateRange};
    use chrono::NaiveDate;
    use url::Url;

    fn query(office: ProductionOffice) -> SearchQuery {
        SearchQuery::new(
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            "test",
            DateRange::Today,
            OrderBy::Newest,
            office,
            20,
            NaiveDate::from_ymd_opt(2017, 7, 17).unwrap(),
        )
    }

    fn snapshot() -> FeedSnapshot {
        FeedSnapshot {
            first_visible: 25,
            page_in_query: 2,
            last_page: Some(4),
            from_date: "2017-07-17".to_string(),
            order_by: OrderBy::Newest,
            production_office: ProductionOffice::Uk,
            articles: vec![NewsArticle::new(
                "Headline",
                "by Someone",
                "Jul 17, 23:01",
                "",
                "",
                "https://www.theguardian.com/x",
                "World news",
            )],
        }
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/session.json");
        save(&snapshot(), &path).await.unwrap();

        let restored = load(&path, &query(ProductionOffice::Uk)).await.unwrap();
        assert_eq!(restored, Some(snapshot()));
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let restored = load(&dir.path().join("nope.json"), &query(ProductionOffice::Uk))
            .await
            .unwrap();
        assert!(restored.is_none());
    }

    #[tokio::test]
    async fn test_other_filters_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        save(&snapshot(), &path).await.unwrap();

        let restored = load(&path, &query(ProductionOffice::Us)).await.unwrap();
        assert!(restored.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load(&path, &query(ProductionOffice::Uk)).await.is_err());
    }

    #[tokio::test]
    async fn test_snapshot_without_last_page_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut value = serde_json::to_value(snapshot()).unwrap();
        value.as_object_mut().unwrap().remove("last_page");
        std::fs::write(&path, value.to_string()).unwrap();

        let restored = load(&path, &query(ProductionOffice::Uk)).await.unwrap().unwrap();
        assert_eq!(restored.last_page, None);
        assert_eq!(restored.page_in_query, 2);
    }
}
