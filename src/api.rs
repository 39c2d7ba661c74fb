//! HTTP access to the content search API.
//!
//! # Architecture
//!
//! The module uses a trait-based design so the reader can be driven by
//! something other than a live HTTP client:
//! - [`ArticleSource`]: Core trait, "give me the body behind this URL"
//! - [`GuardianClient`]: `reqwest` implementation with fixed timeouts
//! - [`RetryFetch`]: Decorator that adds retry logic to any `ArticleSource`
//!
//! # Failure contract
//!
//! [`fetch_page`] and [`fetch_articles`] never return an error. A transport
//! failure or a status other than `200 OK` is logged and produces an empty
//! result, exactly like a response that contains no results.

use crate::models::{NewsArticle, SearchPage};
use crate::parser::extract_page;
use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Time allowed to establish the TCP/TLS connection.
pub const CONNECT_TIMEOUT: StdDuration = StdDuration::from_secs(15);
/// Time allowed between reads of the response.
pub const READ_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Trait for fetching a search response body.
///
/// Implementors return the raw body of a successful (`200 OK`) response or an
/// error describing why there is none.
pub trait ArticleSource {
    /// Perform one request for `url`.
    async fn fetch_body(&self, url: &Url) -> Result<String, Box<dyn Error>>;
}

/// The URL with its `api-key` parameter removed, for logging.
pub fn loggable_url(url: &Url) -> String {
    let mut redacted = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "api-key")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        redacted.set_query(None);
    } else {
        redacted.query_pairs_mut().clear().extend_pairs(kept);
    }
    redacted.to_string()
}

/// `reqwest`-backed [`ArticleSource`].
///
/// Issues a single GET per call with a 15 s connect timeout and a 10 s read
/// timeout. Only `200 OK` counts as success.
#[derive(Debug, Clone)]
pub struct GuardianClient {
    client: Client,
}

impl GuardianClient {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ArticleSource for GuardianClient {
    #[instrument(level = "info", skip_all, fields(url = %loggable_url(url)))]
    async fn fetch_body(&self, url: &Url) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(format!("bad response from server: {status}").into());
        }
        let body = response.text().await?;
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            "Fetched search response"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`ArticleSource`].
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
///
/// With `max_retries == 0` the wrapped source is called exactly once.
pub struct RetryFetch<T> {
    /// The underlying source to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: ArticleSource,
{
    /// Wrap `inner` with retries.
    ///
    /// # Arguments
    ///
    /// * `inner` - The source to wrap
    /// * `max_retries` - Extra attempts after the first failure (0 disables retrying)
    /// * `base_delay` - Delay before the first retry; doubles with each attempt
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> ArticleSource for RetryFetch<T>
where
    T: ArticleSource,
{
    async fn fetch_body(&self, url: &Url) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch_body(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total = total_dt.as_millis() as u64,
                                error = %e,
                                "fetch exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    // backoff calc
                    let shift = u32::try_from(attempt - 1).unwrap_or(u32::MAX).min(16);
                    let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Fetch and parse one page of results.
///
/// # Arguments
///
/// * `source` - Where the body comes from ([`GuardianClient`], possibly
///   wrapped in [`RetryFetch`])
/// * `url` - A full search URL, usually from `SearchQuery::url`
///
/// # Returns
///
/// The parsed page. A transport failure, a status other than `200 OK` or an
/// unparseable body is logged and yields [`SearchPage::empty`].
#[instrument(level = "info", skip_all, fields(url = %loggable_url(url)))]
pub async fn fetch_page<S>(source: &S, url: &Url) -> SearchPage
where
    S: ArticleSource,
{
    match source.fetch_body(url).await {
        Ok(body) => {
            let page = extract_page(&body);
            info!(
                count = page.articles.len(),
                current_page = ?page.current_page,
                pages = ?page.pages,
                "Loaded search page"
            );
            page
        }
        Err(e) => {
            error!(error = %e, "HTTP request was not successful");
            SearchPage::empty()
        }
    }
}

/// Fetch one page and return only its articles.
pub async fn fetch_articles<S>(source: &S, url: &Url) -> Vec<NewsArticle>
where
    S: ArticleSource,
{
    fetch_page(source, url).await.articles
}
