//! Output generation modules for JSON and Markdown exports.
//!
//! # Submodules
//!
//! - [`json`]: Writes the loaded articles to a JSON file for other tools
//! - [`markdown`]: Renders the loaded articles as a Markdown digest and keeps
//!   an index of all digests
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2017-07-17/
//!     ├── uk-newest.json
//!     └── us-relevance.json
//!
//! markdown_output_dir/
//! ├── 2017-07-17_uk-newest.md
//! └── index.md                  # every digest, grouped by date
//! ```
//!
//! Both exports drop repeated articles: with `newest` ordering, items can
//! shift between pages while the reader is paging and show up twice.

use crate::models::NewsArticle;
use crate::query::SearchQuery;
use itertools::Itertools;

pub mod json;
pub mod markdown;

/// Articles with duplicates (same link and headline) removed, first wins.
pub fn unique_articles(articles: &[NewsArticle]) -> Vec<&NewsArticle> {
    articles
        .iter()
        .unique_by(|a| (a.article_link(), a.headline()))
        .collect()
}

/// `uk-newest`, shared by both exports' file names.
pub fn export_stem(query: &SearchQuery) -> String {
    format!("{}-{}", query.production_office, query.order_by)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_articles_keeps_first() {
        let a = NewsArticle::new("A", "", "", "first", "", "https://x/a", "general");
        let a_again = NewsArticle::new("A", "", "", "second", "", "https://x/a", "general");
        let b = NewsArticle::new("B", "", "", "", "", "https://x/b", "general");
        let articles = vec![a.clone(), b.clone(), a_again];

        let unique = unique_articles(&articles);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].trail_text(), "first");
        assert_eq!(unique[1].headline(), "B");
    }
}
