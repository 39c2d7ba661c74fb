//! Plain-text rendering of the article list.
//!
//! Each article becomes a short block:
//!
//! ```text
//!  12. Interest rates held
//!      Business · Jul 17, 23:01 · by Larry Elliott
//!      The Bank keeps rates on hold
//!      https://www.theguardian.com/business/2017/jul/17/rates
//! ```
//!
//! Trail text arrives with inline HTML, which is reduced to its text content.

use crate::models::NewsArticle;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::io::{self, Write};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip markup from an HTML fragment and collapse whitespace.
pub fn html_to_text(fragment: &str) -> String {
    if fragment.is_empty() {
        return String::new();
    }
    let document = Html::parse_fragment(fragment);
    let text = document.root_element().text().collect::<String>();
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// `section · time · author`, skipping an unknown time.
pub fn meta_line(article: &NewsArticle) -> String {
    [article.section(), article.time_published(), article.author()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Write one article block. `position` is 1-based.
pub fn render_article<W: Write>(out: &mut W, position: usize, article: &NewsArticle) -> io::Result<()> {
    writeln!(out, "{position:>3}. {}", article.headline())?;
    writeln!(out, "     {}", meta_line(article))?;
    let summary = html_to_text(article.trail_text());
    if !summary.is_empty() {
        writeln!(out, "     {summary}")?;
    }
    if !article.article_link().is_empty() {
        writeln!(out, "     {}", article.article_link())?;
    }
    if !article.image_link().is_empty() {
        writeln!(out, "     image: {}", article.image_link())?;
    }
    writeln!(out)
}

/// Write a screen of articles, numbering from `first_index` (0-based).
pub fn render_screen<W: Write>(out: &mut W, first_index: usize, articles: &[NewsArticle]) -> io::Result<()> {
    for (offset, article) in articles.iter().enumerate() {
        render_article(out, first_index + offset + 1, article)?;
    }
    out.flush()
}
