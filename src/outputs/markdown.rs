//! Markdown digest of the loaded articles.
//!
//! The digest groups articles by section (alphabetically) with a short table
//! of contents at the top. Each run also records its digest in `index.md`,
//! which lists every digest by date:
//!
//! ```text
//! # Guardian News Digests
//!
//! - **2017-07-17**
//!     - [uk-newest](./2017-07-17_uk-newest.md)
//!     - [us-relevance](./2017-07-17_us-relevance.md)
//! ```

use super::{export_stem, unique_articles};
use crate::models::NewsArticle;
use crate::query::SearchQuery;
use crate::render::html_to_text;
use crate::utils::slugify_title;
use chrono::Local;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const INDEX_HEADING: &str = "# Guardian News Digests";

/// Render the digest document.
pub fn feed_to_markdown(articles: &[NewsArticle], query: &SearchQuery) -> String {
    let mut md = String::new();
    writeln!(
        md,
        "# Guardian news: {} office, {} first, since {}\n",
        query.production_office.as_param().to_uppercase(),
        query.order_by,
        query.from_date
    )
    .unwrap();

    let mut by_section: BTreeMap<&str, Vec<&NewsArticle>> = BTreeMap::new();
    for article in unique_articles(articles) {
        by_section.entry(article.section()).or_default().push(article);
    }

    if by_section.is_empty() {
        md.push_str("No articles found.\n");
        return md;
    }

    for (section, items) in &by_section {
        writeln!(
            md,
            "- [{}](#{}) ({})",
            section,
            slugify_title(section),
            items.len()
        )
        .unwrap();
    }
    md.push('\n');

    for (section, items) in by_section {
        writeln!(md, "## {}\n", section).unwrap();
        for article in items {
            if article.article_link().is_empty() {
                writeln!(md, "### {}\n", article.headline()).unwrap();
            } else {
                writeln!(md, "### [{}]({})\n", article.headline(), article.article_link()).unwrap();
            }
            let byline = [article.author(), article.time_published()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" · ");
            writeln!(md, "*{}*\n", byline).unwrap();
            let summary = html_to_text(article.trail_text());
            if !summary.is_empty() {
                writeln!(md, "{}\n", summary).unwrap();
            }
        }
    }
    md
}

/// Write the digest to `{markdown_output_dir}/{date}_{office}-{order}.md`
/// and record it in `index.md`.
///
/// # Arguments
///
/// * `articles` - The loaded articles; duplicates are dropped
/// * `query` - Filters used for the heading and the file name
/// * `markdown_output_dir` - Directory for the digest and its index
///
/// # Returns
///
/// The path of the digest written.
///
/// # Errors
///
/// Returns an error if the directory, the digest or `index.md` cannot be
/// written.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_digest(
    articles: &[NewsArticle],
    query: &SearchQuery,
    markdown_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(markdown_output_dir).await?;
    let local_date = Local::now().date_naive().to_string();
    let stem = export_stem(query);
    let filename = format!("{}_{}.md", local_date, stem);
    let path = Path::new(markdown_output_dir).join(&filename);

    fs::write(&path, feed_to_markdown(articles, query)).await?;
    info!(path = %path.display(), "Wrote Markdown digest");

    update_index(markdown_output_dir, &local_date, &stem, &filename).await?;
    Ok(path)
}

/// Insert an entry for `filename` under `local_date` in `index.md`, adding
/// the date heading when it is new. Existing entries are left alone.
///
/// # Arguments
///
/// * `content` - Current contents of `index.md` (empty for a new index)
/// * `local_date` - Date heading the entry belongs under
/// * `label` - Link text, e.g. `uk-newest`
/// * `filename` - Digest file name relative to the index
///
/// # Returns
///
/// The new contents. New dates go directly under the title so the newest
/// date comes first.
pub fn insert_index_entry(content: &str, local_date: &str, label: &str, filename: &str) -> String {
    let date_heading = format!("- **{}**", local_date);
    let entry = format!("    - [{}](./{})", label, filename);

    let mut lines: Vec<String> = if content.trim().is_empty() {
        vec![INDEX_HEADING.to_string()]
    } else {
        content.lines().map(|l| l.to_string()).collect()
    };

    if let Some(i) = lines.iter().position(|l| l.trim() == date_heading.trim()) {
        let mut j = i + 1;
        while j < lines.len() && lines[j].starts_with("    - ") {
            if lines[j].trim() == entry.trim() {
                return lines.join("\n") + "\n";
            }
            j += 1;
        }
        lines.insert(j, entry);
    } else if let Some(pos) = lines.iter().position(|l| l.starts_with(INDEX_HEADING)) {
        // newest date first, right under the heading
        lines.insert(pos + 1, String::new());
        lines.insert(pos + 2, date_heading);
        lines.insert(pos + 3, entry);
    } else {
        lines.push(date_heading);
        lines.push(entry);
    }
    lines.join("\n") + "\n"
}

#[instrument(level = "info", skip_all, fields(%markdown_output_dir, %local_date, %filename))]
async fn update_index(
    markdown_output_dir: &str,
    local_date: &str,
    label: &str,
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let index_path = Path::new(markdown_output_dir).join("index.md");
    let content = if index_path.exists() {
        fs::read_to_string(&index_path).await?
    } else {
        String::new()
    };
    fs::write(&index_path, insert_index_entry(&content, local_date, label, filename)).await?;
    info!(path = %index_path.display(), "Updated digest index");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{DEFAULT_BASE_URL, DateRange, OrderBy, ProductionOffice};
    use chrono::NaiveDate;
    use url::Url;

    fn query() -> SearchQuery {
        SearchQuery::new(
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            "test",
            DateRange::Today,
            OrderBy::Newest,
            ProductionOffice::Uk,
            20,
            NaiveDate::from_ymd_opt(2017, 7, 17).unwrap(),
        )
    }

    fn articles() -> Vec<NewsArticle> {
        vec![
            NewsArticle::new(
                "Rates held",
                "by Larry Elliott",
                "Jul 17, 23:01",
                "The <strong>Bank</strong> waits",
                "",
                "https://x/rates",
                "Business",
            ),
            NewsArticle::new("Goal", "author not given", "", "", "", "https://x/goal", "Sport"),
            NewsArticle::new("Markets", "by A", "", "", "", "https://x/markets", "Business"),
        ]
    }

    #[test]
    fn test_feed_to_markdown_groups_sections() {
        let md = feed_to_markdown(&articles(), &query());
        assert!(md.starts_with("# Guardian news: UK office, newest first, since 2017-07-17\n"));
        assert!(md.contains("- [Business](#business) (2)"));
        assert!(md.contains("- [Sport](#sport) (1)"));
        assert!(md.contains("### [Rates held](https://x/rates)\n\n*by Larry Elliott · Jul 17, 23:01*\n\nThe Bank waits\n"));
        assert!(md.find("## Business").unwrap() < md.find("## Sport").unwrap());
        assert!(md.find("Rates held").unwrap() < md.find("Markets").unwrap());
    }

    #[test]
    fn test_feed_to_markdown_empty() {
        let md = feed_to_markdown(&[], &query());
        assert!(md.ends_with("No articles found.\n"));
    }

    #[test]
    fn test_insert_index_entry_new_file() {
        let out = insert_index_entry("", "2017-07-17", "uk-newest", "2017-07-17_uk-newest.md");
        assert_eq!(
            out,
            "# Guardian News Digests\n\n- **2017-07-17**\n    - [uk-newest](./2017-07-17_uk-newest.md)\n"
        );
    }

    #[test]
    fn test_insert_index_entry_existing_date_and_duplicate() {
        let first = insert_index_entry("", "2017-07-17", "uk-newest", "2017-07-17_uk-newest.md");
        let second = insert_index_entry(&first, "2017-07-17", "us-oldest", "2017-07-17_us-oldest.md");
        assert!(second.contains(
            "- **2017-07-17**\n    - [uk-newest](./2017-07-17_uk-newest.md)\n    - [us-oldest](./2017-07-17_us-oldest.md)\n"
        ));
        let again = insert_index_entry(&second, "2017-07-17", "us-oldest", "2017-07-17_us-oldest.md");
        assert_eq!(again, second);
    }

    #[test]
    fn test_insert_index_entry_new_date_goes_first() {
        let first = insert_index_entry("", "2017-07-17", "uk-newest", "2017-07-17_uk-newest.md");
        let next = insert_index_entry(&first, "2017-07-18", "uk-newest", "2017-07-18_uk-newest.md");
        assert!(next.find("2017-07-18").unwrap() < next.find("2017-07-17").unwrap());
    }

    #[tokio::test]
    async fn test_write_digest_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().to_str().unwrap();
        let path = write_digest(&articles(), &query(), out_dir).await.unwrap();
        assert!(path.exists());
        let index = std::fs::read_to_string(dir.path().join("index.md")).unwrap();
        assert!(index.contains("uk-newest"));
    }
}
