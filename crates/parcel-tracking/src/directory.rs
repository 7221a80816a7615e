//! # Order Directory
//!
//! Filtering, sorting and pagination over order summaries. The functions here are pure: storage
//! hands in the candidate rows (the order actor answers `List` requests with [`OrderFilter`]) and
//! [`paginate`] turns the filtered set into one page.
//!
//! Rows are sorted by `created_at` descending, ties by order id ascending, so pages are stable and
//! together partition the filtered set.

use crate::model::{OrderStatus, OrderSummary, UnknownStatus};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("invalid page request: page {page_number}, size {page_size} (max size {max_page_size})")]
    InvalidPage {
        page_number: u32,
        page_size: u32,
        max_page_size: u32,
    },
}

/// Status criterion of a listing query. `All` is the listing screen's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn accepts(self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl From<OrderStatus> for StatusFilter {
    fn from(status: OrderStatus) -> Self {
        StatusFilter::Only(status)
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

impl Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(status) => Display::fmt(status, f),
        }
    }
}

/// Inclusive range of creation times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Whole calendar days from the start of `from` to the last instant of `to`, in UTC.
    pub fn days(from: NaiveDate, to: NaiveDate) -> Self {
        let start = from.and_time(NaiveTime::MIN).and_utc();
        let end = to
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(NaiveTime::MIN).and_utc() - TimeDelta::nanoseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(start, end)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

/// Listing criteria. All present criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: StatusFilter,
    pub date_range: Option<DateRange>,
    /// Case-insensitive substring of the order id or recipient. Blank means no text criterion.
    pub text: Option<String>,
}

impl OrderFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl Into<StatusFilter>) -> Self {
        self.status = status.into();
        self
    }

    pub fn within(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn matching(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn matches(&self, row: &OrderSummary) -> bool {
        if !self.status.accepts(row.current_status) {
            return false;
        }
        if let Some(range) = &self.date_range {
            if !range.contains(row.created_at) {
                return false;
            }
        }
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                row.order_id.as_str().to_lowercase().contains(&needle)
                    || row.recipient.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// 1-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    pub fn validate(&self, max_page_size: u32) -> Result<(), DirectoryError> {
        if self.page_number == 0 || self.page_size == 0 || self.page_size > max_page_size {
            return Err(DirectoryError::InvalidPage {
                page_number: self.page_number,
                page_size: self.page_size,
                max_page_size,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// Size of the filtered set before pagination.
    pub total_count: usize,
    pub page_number: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = self.total_count.div_ceil(self.page_size as usize);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages()
    }
}

/// Listing order: newest first, then order id ascending.
pub fn sort_rows(rows: &mut [OrderSummary]) {
    rows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.order_id.cmp(&b.order_id))
    });
}

/// Sorts an already-filtered set and cuts out the requested page.
pub fn paginate(
    mut rows: Vec<OrderSummary>,
    page: PageRequest,
    max_page_size: u32,
) -> Result<PagedResult<OrderSummary>, DirectoryError> {
    page.validate(max_page_size)?;
    sort_rows(&mut rows);

    let total_count = rows.len();
    let skip = (page.page_number as usize - 1).saturating_mul(page.page_size as usize);
    let items = rows
        .into_iter()
        .skip(skip)
        .take(page.page_size as usize)
        .collect();

    Ok(PagedResult {
        items,
        total_count,
        page_number: page.page_number,
        page_size: page.page_size,
    })
}

/// Filters, sorts and paginates `rows`.
pub fn query(
    rows: impl IntoIterator<Item = OrderSummary>,
    filter: &OrderFilter,
    page: PageRequest,
    max_page_size: u32,
) -> Result<PagedResult<OrderSummary>, DirectoryError> {
    page.validate(max_page_size)?;
    let filtered = rows.into_iter().filter(|row| filter.matches(row)).collect();
    paginate(filtered, page, max_page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn row(id: &str, recipient: &str, day: u32, status: OrderStatus) -> OrderSummary {
        OrderSummary {
            order_id: id.into(),
            created_at: Utc.with_ymd_and_hms(2025, 8, day, 12, 0, 0).unwrap(),
            recipient: recipient.to_string(),
            destination_address: "1 Dock Road".to_string(),
            current_status: status,
            estimated_delivery: None,
        }
    }

    fn rows() -> Vec<OrderSummary> {
        vec![
            row("ORD1003", "Ana Souza", 3, OrderStatus::Delivered),
            row("ORD1001", "Ben Okafor", 1, OrderStatus::InTransit),
            row("ORD1002", "ana lima", 3, OrderStatus::Confirmed),
            row("ORD1004", "Chen Wei", 5, OrderStatus::Delivered),
            row("ORD1005", "Dara Byrne", 7, OrderStatus::Failed),
        ]
    }

    fn ids(result: &PagedResult<OrderSummary>) -> Vec<&str> {
        result.items.iter().map(|r| r.order_id.as_str()).collect()
    }

    #[test]
    fn sorts_newest_first_with_id_tiebreak() {
        let result = query(rows(), &OrderFilter::all(), PageRequest::first(10), 100).unwrap();
        assert_eq!(
            ids(&result),
            vec!["ORD1005", "ORD1004", "ORD1002", "ORD1003", "ORD1001"]
        );
    }

    #[test]
    fn text_matches_id_or_recipient_case_insensitively() {
        let filter = OrderFilter::all().matching("ANA");
        let result = query(rows(), &filter, PageRequest::first(10), 100).unwrap();
        assert_eq!(ids(&result), vec!["ORD1002", "ORD1003"]);

        let filter = OrderFilter::all().matching("1004");
        assert_eq!(query(rows(), &filter, PageRequest::first(10), 100).unwrap().total_count, 1);
    }

    #[test]
    fn blank_text_is_no_filter() {
        let filter = OrderFilter::all().matching("   ");
        assert_eq!(query(rows(), &filter, PageRequest::first(10), 100).unwrap().total_count, 5);
    }

    #[test]
    fn filters_compose_with_and() {
        let filter = OrderFilter::all()
            .with_status(OrderStatus::Delivered)
            .within(DateRange::days(
                NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 8, 3).unwrap(),
            ));
        let result = query(rows(), &filter, PageRequest::first(10), 100).unwrap();
        assert_eq!(ids(&result), vec!["ORD1003"]);
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let day = NaiveDate::from_ymd_opt(2025, 8, 3).unwrap();
        let range = DateRange::days(day, day);
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 8, 3, 0, 0, 0).unwrap()));
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 8, 3, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 8, 4, 0, 0, 0).unwrap()));

        let exact = Utc.with_ymd_and_hms(2025, 8, 5, 12, 0, 0).unwrap();
        assert!(DateRange::new(exact, exact).contains(exact));
    }

    #[test]
    fn pages_partition_the_filtered_set() {
        let all = rows();
        let mut seen = HashSet::new();
        let mut collected = 0;
        for number in 1..=3 {
            let page = query(all.clone(), &OrderFilter::all(), PageRequest::new(number, 2), 100)
                .unwrap();
            assert!(page.items.len() <= 2);
            assert_eq!(page.total_count, 5);
            assert_eq!(page.total_pages(), 3);
            collected += page.items.len();
            for item in page.items {
                assert!(seen.insert(item.order_id));
            }
        }
        assert_eq!(collected, 5);
    }

    #[test]
    fn page_beyond_range_is_empty_not_error() {
        let result = query(rows(), &OrderFilter::all(), PageRequest::new(9, 2), 100).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_count, 5);
        assert!(!result.has_next());
    }

    #[test]
    fn invalid_page_requests_are_rejected() {
        for page in [PageRequest::new(0, 10), PageRequest::new(1, 0), PageRequest::new(1, 101)] {
            assert!(matches!(
                query(rows(), &OrderFilter::all(), page, 100),
                Err(DirectoryError::InvalidPage { .. })
            ));
        }
    }

    #[test]
    fn status_filter_parses_all_and_statuses() {
        assert_eq!("All".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "In Transit".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(OrderStatus::InTransit))
        );
        assert_eq!(StatusFilter::Only(OrderStatus::PickedUp).to_string(), "Picked Up");
    }

    #[test]
    fn paged_result_serializes_camel_case() {
        let result = query(rows(), &OrderFilter::all(), PageRequest::first(1), 100).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalCount"], 5);
        assert_eq!(json["pageSize"], 1);
        assert_eq!(json["items"][0]["orderId"], "ORD1005");
    }
}
