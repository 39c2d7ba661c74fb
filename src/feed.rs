//! The reading session: a growing article list viewed one screen at a time.
//!
//! [`Feed`] ties the pieces together. It owns the list of loaded articles
//! and the viewport, feeds every viewport change into [`EndlessScroll`], and
//! when the state machine asks for another page it builds the URL, fetches
//! it through an [`ArticleSource`] and appends the result.
//!
//! The very first page is loaded directly by [`Feed::start`]; every later
//! page is requested by the scroll state machine.

use crate::api::{ArticleSource, fetch_page};
use crate::config::FeedSettings;
use crate::models::NewsArticle;
use crate::pagination::{Connectivity, EndlessScroll};
use crate::query::SearchQuery;
use crate::session::FeedSnapshot;
use tracing::{debug, info, instrument};

/// What a call to [`Feed::scroll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEvent {
    /// The network was unreachable; nothing changed.
    Offline,
    /// No page was requested.
    Idle,
    /// `page` was fetched and `count` articles were appended.
    Loaded { page: u32, count: usize },
}

pub struct Feed<S, C> {
    source: S,
    query: SearchQuery,
    scroll: EndlessScroll<C>,
    articles: Vec<NewsArticle>,
    first_visible: usize,
    visible_items: usize,
    page_in_query: u32,
    last_page: Option<u32>,
    max_pages: Option<u32>,
}

impl<S, C> Feed<S, C>
where
    S: ArticleSource,
    C: Connectivity,
{
    /// A fresh session, positioned before page 1.
    pub fn new(source: S, query: SearchQuery, connectivity: C, settings: &FeedSettings) -> Self {
        Self {
            source,
            query,
            scroll: EndlessScroll::starting_at(connectivity, 0, settings.visible_threshold),
            articles: Vec::new(),
            first_visible: 0,
            visible_items: settings.visible_items.max(1),
            page_in_query: 1,
            last_page: None,
            max_pages: settings.page_limit(),
        }
    }

    /// Resume a saved session.
    ///
    /// The page counter starts one below the saved page so the restored
    /// articles complete a "load" on the first scroll update and the next
    /// request is for the page after the saved one.
    ///
    /// # Arguments
    ///
    /// * `source` - Source for pages after the restored ones
    /// * `query` - Filters of this run; `snapshot` must have been taken for them
    /// * `connectivity` - Reachability check run before every scroll update
    /// * `settings` - Screen size, threshold and page limit
    /// * `snapshot` - Saved articles, position, last requested page and the
    ///   page count the API reported
    ///
    /// # Returns
    ///
    /// A feed positioned where the snapshot left off. No request is made
    /// until the first [`Feed::scroll`].
    pub fn restore(
        source: S,
        query: SearchQuery,
        connectivity: C,
        settings: &FeedSettings,
        snapshot: FeedSnapshot,
    ) -> Self {
        let starting_page = snapshot.page_in_query.saturating_sub(1);
        let first_visible = snapshot
            .first_visible
            .min(snapshot.articles.len().saturating_sub(1));
        Self {
            source,
            query,
            scroll: EndlessScroll::starting_at(connectivity, starting_page, settings.visible_threshold),
            articles: snapshot.articles,
            first_visible,
            visible_items: settings.visible_items.max(1),
            page_in_query: snapshot.page_in_query.max(1),
            last_page: snapshot.last_page,
            max_pages: settings.page_limit(),
        }
    }

    /// Load the first page. Returns the number of articles received.
    #[instrument(level = "info", skip_all)]
    pub async fn start(&mut self) -> usize {
        self.load(self.page_in_query).await
    }

    async fn load(&mut self, page: u32) -> usize {
        self.page_in_query = page;
        let url = self.query.url(page);
        let result = fetch_page(&self.source, &url).await;
        if result.pages.is_some() {
            self.last_page = result.pages;
        }
        let count = result.articles.len();
        self.articles.extend(result.articles);
        info!(page, count, total = self.articles.len(), "Appended page");
        count
    }

    /// Report the current viewport to the scroll state machine and load the
    /// page it asks for, if any.
    pub async fn scroll(&mut self) -> ScrollEvent {
        let total = self.articles.len();
        let visible_count = self.visible().len();
        let last_page = self.last_page;
        let max_pages = self.max_pages;
        let mut requested = None;

        let online = self
            .scroll
            .on_scroll(self.first_visible, visible_count, total, |page, _| {
                let past_end = last_page.is_some_and(|last| page > last)
                    || max_pages.is_some_and(|max| page > max);
                if past_end {
                    debug!(page, ?last_page, ?max_pages, "No more pages to load");
                    return false;
                }
                requested = Some(page);
                true
            });

        if !online {
            return ScrollEvent::Offline;
        }
        match requested {
            Some(page) => {
                let count = self.load(page).await;
                ScrollEvent::Loaded { page, count }
            }
            None => ScrollEvent::Idle,
        }
    }

    /// Move the viewport down one screen. Returns `false` at the end of the
    /// loaded list.
    pub fn advance(&mut self) -> bool {
        let next = self.first_visible + self.visible_items;
        if next >= self.articles.len() {
            return false;
        }
        self.first_visible = next;
        true
    }

    /// Articles currently on screen.
    pub fn visible(&self) -> &[NewsArticle] {
        let start = self.first_visible.min(self.articles.len());
        let end = (start + self.visible_items).min(self.articles.len());
        &self.articles[start..end]
    }

    pub fn first_visible(&self) -> usize {
        self.first_visible
    }

    pub fn articles(&self) -> &[NewsArticle] {
        &self.articles
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Last page requested from the API.
    pub fn page_in_query(&self) -> u32 {
        self.page_in_query
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            first_visible: self.first_visible,
            page_in_query: self.page_in_query,
            last_page: self.last_page,
            from_date: self.query.from_date.clone(),
            order_by: self.query.order_by,
            production_office: self.query.production_office,
            articles: self.articles.clone(),
        }
    }
}
