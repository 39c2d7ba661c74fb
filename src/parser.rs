//! Extraction of [`NewsArticle`]s from search API responses.
//!
//! The API wraps results in an envelope:
//!
//! ```text
//! { "response": { "currentPage": 1, "pages": 40, "total": 800,
//!                 "results": [ { "webTitle": ..., "fields": { "trailText": ... } } ] } }
//! ```
//!
//! Extraction is a flat projection of `response.results[]`. Individual
//! fields are optional and fall back to sentinels, but a body that is not
//! JSON, or has no `response.results` at all, produces an empty page. A
//! partially usable list is never returned.

use crate::models::{AUTHOR_PREFIX, NO_AUTHOR, NO_HEADLINE, NO_SECTION, NewsArticle, SearchPage};
use crate::utils::{looks_truncated, truncate_for_log};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Wire format of `webPublicationDate`.
const PUBLICATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
/// Display format for the list, e.g. `Jul 17, 23:01`.
const DISPLAY_FORMAT: &str = "%b %d, %H:%M";

static PUBLICATION_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").unwrap());

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<ResponseBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    results: Option<Vec<RawResult>>,
    #[serde(default, deserialize_with = "lenient_u64")]
    current_page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pages: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResult {
    #[serde(default, deserialize_with = "scalar_text")]
    web_title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    web_url: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    web_publication_date: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    section_name: Option<String>,
    #[serde(default)]
    fields: Option<RawFields>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFields {
    #[serde(default, deserialize_with = "scalar_text")]
    trail_text: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    byline: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    thumbnail: Option<String>,
}

/// Accept any scalar as text. `null` and containers count as missing.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_u64())
}

impl From<RawResult> for NewsArticle {
    fn from(raw: RawResult) -> Self {
        let fields = raw.fields.unwrap_or_default();

        let headline = raw
            .web_title
            .map(|title| trim_headline(&title))
            .unwrap_or_else(|| NO_HEADLINE.to_string());
        let author = fields
            .byline
            .map(|byline| format!("{AUTHOR_PREFIX}{byline}"))
            .unwrap_or_else(|| NO_AUTHOR.to_string());
        let time_published = raw
            .web_publication_date
            .map(|date| format_publish_time(&date))
            .unwrap_or_default();

        NewsArticle::new(
            headline,
            author,
            time_published,
            fields.trail_text.unwrap_or_default(),
            fields.thumbnail.unwrap_or_default(),
            raw.web_url.unwrap_or_default(),
            raw.section_name.unwrap_or_else(|| NO_SECTION.to_string()),
        )
    }
}

/// Parse a response body into a [`SearchPage`].
///
/// Never fails: malformed input is logged and yields [`SearchPage::empty`].
#[instrument(level = "debug", skip_all, fields(bytes = body.len()))]
pub fn extract_page(body: &str) -> SearchPage {
    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            if looks_truncated(&e) {
                warn!(error = %e, "Response body ended early; no articles extracted");
            } else {
                warn!(
                    error = %e,
                    body_preview = %truncate_for_log(body, 300),
                    "Response body is not a valid search response"
                );
            }
            return SearchPage::empty();
        }
    };

    let Some(response) = envelope.response else {
        warn!("Response has no `response` object");
        return SearchPage::empty();
    };
    let Some(results) = response.results else {
        debug!("Response has no `results`; treating as empty");
        return SearchPage::empty();
    };

    let articles: Vec<NewsArticle> = results.into_iter().map(NewsArticle::from).collect();
    debug!(count = articles.len(), "Extracted articles");

    SearchPage {
        articles,
        current_page: response.current_page.and_then(|p| u32::try_from(p).ok()),
        pages: response.pages.and_then(|p| u32::try_from(p).ok()),
        total: response.total,
    }
}

/// Parse a response body into its article list.
pub fn extract_articles(body: &str) -> Vec<NewsArticle> {
    extract_page(body).articles
}

/// Drop the `| author` suffix some titles carry.
///
/// Keeps the text before the first `|`, minus the one character right before
/// it (normally the separating space). A title without a pipe is unchanged.
pub fn trim_headline(title: &str) -> String {
    match title.find('|') {
        Some(pipe) => {
            let mut before = title[..pipe].chars();
            before.next_back();
            before.as_str().to_string()
        }
        None => title.to_string(),
    }
}

/// Convert `yyyy-MM-ddTHH:mm:ssZ` into `MMM dd, HH:mm`.
///
/// The clock digits are kept as sent. Anything not in the exact wire format
/// yields an empty string.
pub fn format_publish_time(raw: &str) -> String {
    if !PUBLICATION_SHAPE.is_match(raw) {
        warn!(raw, "Publication date is not in the expected format");
        return String::new();
    }
    match NaiveDateTime::parse_from_str(raw, PUBLICATION_FORMAT) {
        Ok(date) => date.format(DISPLAY_FORMAT).to_string(),
        Err(e) => {
            warn!(raw, error = %e, "Could not parse publication date");
            String::new()
        }
    }
}
