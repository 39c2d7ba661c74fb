//! Layered configuration: built-in defaults, a YAML preferences file, then
//! command-line flags.
//!
//! ```yaml
//! preferences:
//!   from_date: last-week        # or "last week"
//!   order_by: newest
//!   production_office: uk
//! feed:
//!   visible_items: 5
//!   visible_threshold: 5
//!   max_pages: 5                # 0 for no limit
//! api:
//!   base_url: https://content.guardianapis.com/search
//!   api_key: test
//!   page_size: 20
//!   retries: 0
//! ```
//!
//! Every key is optional.

use crate::cli::Cli;
use crate::pagination::DEFAULT_VISIBLE_THRESHOLD;
use crate::query::{
    DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, DateRange, OrderBy, ProductionOffice,
    SearchQuery,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::{info, instrument};
use url::Url;

/// Search filters chosen by the reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Preferences {
    pub from_date: DateRange,
    pub order_by: OrderBy,
    pub production_office: ProductionOffice,
}

/// How the list is paged through.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Articles shown per screen.
    pub visible_items: usize,
    /// Items left below the screen that trigger the next page request.
    pub visible_threshold: usize,
    /// Highest page number that will be requested; `0` means unlimited.
    pub max_pages: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            visible_items: 5,
            visible_threshold: DEFAULT_VISIBLE_THRESHOLD,
            max_pages: 5,
        }
    }
}

impl FeedSettings {
    /// The page cap, if any.
    pub fn page_limit(&self) -> Option<u32> {
        (self.max_pages > 0).then_some(self.max_pages)
    }
}

/// Where and how requests are sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: String,
    pub page_size: u32,
    pub retries: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            retries: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub preferences: Preferences,
    pub feed: FeedSettings,
    pub api: ApiSettings,
}

impl Config {
    /// Parse a YAML preferences document.
    pub fn from_yaml(yaml: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML preferences file.
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&yaml)?;
        info!(?config.preferences, "Loaded preferences");
        Ok(config)
    }

    /// Build the effective configuration for a command line.
    pub fn resolve(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let base = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.merge_cli(cli))
    }

    /// Let flags given on the command line win over file values.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(v) = cli.from_date {
            self.preferences.from_date = v;
        }
        if let Some(v) = cli.order_by {
            self.preferences.order_by = v;
        }
        if let Some(v) = cli.production_office {
            self.preferences.production_office = v;
        }
        if let Some(v) = cli.visible_items {
            self.feed.visible_items = v;
        }
        if let Some(v) = cli.threshold {
            self.feed.visible_threshold = v;
        }
        if let Some(v) = cli.max_pages {
            self.feed.max_pages = v;
        }
        if let Some(v) = &cli.base_url {
            self.api.base_url = v.clone();
        }
        if let Some(v) = &cli.api_key {
            self.api.api_key = v.clone();
        }
        if let Some(v) = cli.page_size {
            self.api.page_size = v;
        }
        if let Some(v) = cli.retries {
            self.api.retries = v;
        }
        // a zero-item screen would never move
        self.feed.visible_items = self.feed.visible_items.max(1);
        self
    }

    /// The search query for today's date.
    pub fn search_query(&self) -> Result<SearchQuery, Box<dyn Error>> {
        let base_url = Url::parse(&self.api.base_url)?;
        Ok(SearchQuery::starting_today(
            base_url,
            self.api.api_key.clone(),
            self.preferences.from_date,
            self.preferences.order_by,
            self.preferences.production_office,
            self.api.page_size,
        ))
    }
}
