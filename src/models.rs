//! Data models for articles returned by the content search API.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewsArticle`]: One search result, flattened into display-ready text
//! - [`SearchPage`]: One page of results plus the paging metadata the API reports
//!
//! Every article field is plain text. A field missing from the source data is
//! replaced with a fixed sentinel (see [`NO_HEADLINE`], [`NO_AUTHOR`],
//! [`NO_SECTION`]) or an empty string, so consumers never deal with `Option`s.

use serde::{Deserialize, Serialize};

/// Headline used when the result has no `webTitle`.
pub const NO_HEADLINE: &str = "no headline";
/// Author line used when the result has no `fields.byline`.
pub const NO_AUTHOR: &str = "author not given";
/// Section used when the result has no `sectionName`.
pub const NO_SECTION: &str = "general";
/// Prefix added in front of a byline.
pub const AUTHOR_PREFIX: &str = "by ";

/// A single news article as shown in the list.
///
/// Instances are immutable once built: the fields are private and only
/// exposed through accessors. Construction goes through [`NewsArticle::new`],
/// which is what the parser uses after applying the sentinel rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsArticle {
    headline: String,
    author: String,
    time_published: String,
    trail_text: String,
    image_link: String,
    article_link: String,
    section: String,
}

impl NewsArticle {
    /// Build an article from already-normalised field values.
    pub fn new(
        headline: impl Into<String>,
        author: impl Into<String>,
        time_published: impl Into<String>,
        trail_text: impl Into<String>,
        image_link: impl Into<String>,
        article_link: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        Self {
            headline: headline.into(),
            author: author.into(),
            time_published: time_published.into(),
            trail_text: trail_text.into(),
            image_link: image_link.into(),
            article_link: article_link.into(),
            section: section.into(),
        }
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Publication time in `MMM dd, HH:mm` form, or empty when unknown.
    pub fn time_published(&self) -> &str {
        &self.time_published
    }

    /// Summary text. May contain inline HTML markup.
    pub fn trail_text(&self) -> &str {
        &self.trail_text
    }

    pub fn image_link(&self) -> &str {
        &self.image_link
    }

    pub fn article_link(&self) -> &str {
        &self.article_link
    }

    pub fn section(&self) -> &str {
        &self.section
    }
}

/// One page of search results.
///
/// The paging fields come straight from the API envelope and are `None` when
/// the response did not carry them (or when the fetch failed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Articles on this page, in response order.
    pub articles: Vec<NewsArticle>,
    /// The page number the API says it served.
    pub current_page: Option<u32>,
    /// Total number of pages available for the query.
    pub pages: Option<u32>,
    /// Total number of results available for the query.
    pub total: Option<u64>,
}

impl SearchPage {
    /// An empty page with no metadata, used for every failure path.
    pub fn empty() -> Self {
        Self::default()
    }
}
