//! Search query construction for the content search API.
//!
//! The reader exposes three filters, each backed by an enum that knows its
//! wire value:
//!
//! | Filter | Enum | Query parameter |
//! |--------|------|-----------------|
//! | Date range | [`DateRange`] | `from-date` (`yyyy-MM-dd`, computed from today) |
//! | Sort order | [`OrderBy`] | `order-by` |
//! | Production office | [`ProductionOffice`] | `production-office` |
//!
//! [`SearchQuery::url`] assembles the full request URL for a given page.

use chrono::{Duration, Local, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Default search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://content.guardianapis.com/search";
/// Key accepted by the API for low-volume, unauthenticated use.
pub const DEFAULT_API_KEY: &str = "test";
/// Results requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Extra fields requested for every result.
const SHOW_FIELDS: &str = "trailText,byline,thumbnail";

/// How far back the search reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DateRange {
    #[default]
    Today,
    #[serde(alias = "today and yesterday")]
    TodayAndYesterday,
    #[serde(alias = "last week")]
    LastWeek,
    #[serde(alias = "last two weeks")]
    LastTwoWeeks,
    #[serde(rename = "last-30-days", alias = "last 30 days")]
    #[value(name = "last-30-days")]
    Last30Days,
}

impl DateRange {
    /// Number of days subtracted from today.
    pub fn days_back(self) -> i64 {
        match self {
            DateRange::Today => 0,
            DateRange::TodayAndYesterday => 1,
            DateRange::LastWeek => 6,
            DateRange::LastTwoWeeks => 13,
            DateRange::Last30Days => 30,
        }
    }

    /// The `from-date` parameter relative to `today`, as `yyyy-MM-dd`.
    pub fn from_date(self, today: NaiveDate) -> String {
        (today - Duration::days(self.days_back()))
            .format("%Y-%m-%d")
            .to_string()
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OrderBy {
    #[default]
    Newest,
    Oldest,
    Relevance,
}

impl OrderBy {
    pub fn as_param(self) -> &'static str {
        match self {
            OrderBy::Newest => "newest",
            OrderBy::Oldest => "oldest",
            OrderBy::Relevance => "relevance",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Editorial office that produced the content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProductionOffice {
    #[default]
    Uk,
    Us,
    Aus,
}

impl ProductionOffice {
    pub fn as_param(self) -> &'static str {
        match self {
            ProductionOffice::Uk => "uk",
            ProductionOffice::Us => "us",
            ProductionOffice::Aus => "aus",
        }
    }
}

impl fmt::Display for ProductionOffice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// A fully resolved search: endpoint, credentials and filters.
///
/// The `from-date` is fixed when the query is built so every page of one
/// reading session asks for the same window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    #[serde(skip)]
    base_url: Url,
    #[serde(skip)]
    api_key: String,
    pub from_date: String,
    pub order_by: OrderBy,
    pub production_office: ProductionOffice,
    pub page_size: u32,
}

impl SearchQuery {
    /// Build a query anchored to `today`.
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        date_range: DateRange,
        order_by: OrderBy,
        production_office: ProductionOffice,
        page_size: u32,
        today: NaiveDate,
    ) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            from_date: date_range.from_date(today),
            order_by,
            production_office,
            page_size,
        }
    }

    /// Same as [`SearchQuery::new`] anchored to the local calendar date.
    pub fn starting_today(
        base_url: Url,
        api_key: impl Into<String>,
        date_range: DateRange,
        order_by: OrderBy,
        production_office: ProductionOffice,
        page_size: u32,
    ) -> Self {
        Self::new(
            base_url,
            api_key,
            date_range,
            order_by,
            production_office,
            page_size,
            Local::now().date_naive(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The request URL for `page` (1-based).
    pub fn url(&self, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("production-office", self.production_office.as_param())
            .append_pair("from-date", &self.from_date)
            .append_pair("order-by", self.order_by.as_param())
            .append_pair("show-fields", SHOW_FIELDS)
            .append_pair("page", &page.to_string())
            .append_pair("page-size", &self.page_size.to_string())
            .append_pair("api-key", &self.api_key);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 7, 17).unwrap()
    }

    fn query() -> SearchQuery {
        SearchQuery::new(
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            DEFAULT_API_KEY,
            DateRange::LastWeek,
            OrderBy::Newest,
            ProductionOffice::Uk,
            DEFAULT_PAGE_SIZE,
            today(),
        )
    }

    #[test]
    fn test_from_date_offsets() {
        assert_eq!(DateRange::Today.from_date(today()), "2017-07-17");
        assert_eq!(DateRange::TodayAndYesterday.from_date(today()), "2017-07-16");
        assert_eq!(DateRange::LastWeek.from_date(today()), "2017-07-11");
        assert_eq!(DateRange::LastTwoWeeks.from_date(today()), "2017-07-04");
        assert_eq!(DateRange::Last30Days.from_date(today()), "2017-06-17");
    }

    #[test]
    fn test_from_date_crosses_year() {
        let new_year = NaiveDate::from_ymd_opt(2018, 1, 3).unwrap();
        assert_eq!(DateRange::LastWeek.from_date(new_year), "2017-12-28");
    }

    #[test]
    fn test_query_url_parameter_order() {
        let url = query().url(3);
        assert_eq!(
            url.as_str(),
            "https://content.guardianapis.com/search?production-office=uk&from-date=2017-07-11\
             &order-by=newest&show-fields=trailText%2Cbyline%2Cthumbnail&page=3&page-size=20&api-key=test"
        );
    }

    #[test]
    fn test_query_url_does_not_accumulate() {
        let q = query();
        let first = q.url(1);
        let second = q.url(2);
        assert_eq!(first.query_pairs().count(), 7);
        assert_eq!(second.query_pairs().count(), 7);
        assert!(second.as_str().contains("page=2"));
    }

    #[test]
    fn test_date_range_accepts_preference_labels() {
        let parsed: DateRange = serde_yaml::from_str("\"today and yesterday\"").unwrap();
        assert_eq!(parsed, DateRange::TodayAndYesterday);
        let parsed: DateRange = serde_yaml::from_str("last-30-days").unwrap();
        assert_eq!(parsed, DateRange::Last30Days);
        let parsed: DateRange = serde_yaml::from_str("last 30 days").unwrap();
        assert_eq!(parsed, DateRange::Last30Days);
    }

    #[test]
    fn test_enum_params() {
        assert_eq!(OrderBy::Relevance.to_string(), "relevance");
        assert_eq!(ProductionOffice::Aus.to_string(), "aus");
    }
}
