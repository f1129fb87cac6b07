//! Query construction: pagination normalisation and prefix matching.
//!
//! Pagination parameters arrive as raw query-string text. They are
//! normalised here so every backend sees the same `(page, limit)` pair:
//!
//! - `limit` defaults to [`DEFAULT_LIMIT`]; anything above it is clamped
//!   down, and non-numeric, zero or negative values fall back to the default.
//! - `page` is 1-based; non-numeric, zero or negative values become 1. The
//!   page is never clamped against the number of available pages.

use std::cmp::Ordering;

use crate::models::{Contact, ContactFilter};

/// Default page size, which is also the hard ceiling.
pub const DEFAULT_LIMIT: u64 = 10;

/// A normalised `(page, limit)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Normalise raw `page` / `limit` query values.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let limit = parse_positive(limit)
            .map(|l| l.min(DEFAULT_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);
        Self { page, limit }
    }

    /// Number of records to skip before the page starts.
    ///
    /// Saturates at `u64::MAX`, which is past the end of any store.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`; zero when nothing matched.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit.max(1))
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v as u64)
}

/// Case folding shared by every backend's prefix matching.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Case-insensitive "starts with" comparison.
pub fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    fold_case(value).starts_with(&fold_case(prefix))
}

/// True when `contact` satisfies every populated field of `filter`.
pub fn matches_filter(contact: &Contact, filter: &ContactFilter) -> bool {
    filter
        .prefixes()
        .into_iter()
        .all(|(field, prefix)| starts_with_ignore_case(field.value_of(contact), prefix))
}

/// Listing order: first name, then last name, then id.
pub fn listing_order(a: &Contact, b: &Contact) -> Ordering {
    a.first_name
        .cmp(&b.first_name)
        .then_with(|| a.last_name.cmp(&b.last_name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Escape `%`, `_` and `\` so a prefix can be used literally in a SQL
/// `LIKE ... ESCAPE '\'` pattern, and append the trailing wildcard.
pub fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, first: &str, last: &str) -> Contact {
        Contact {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: format!("p-{}", id),
            address: "1 Main St".to_string(),
        }
    }

    #[test]
    fn test_defaults() {
        let p = Pagination::from_raw(None, None);
        assert_eq!(p, Pagination { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_limit_above_ceiling_is_clamped() {
        assert_eq!(Pagination::from_raw(None, Some("50")).limit, 10);
        assert_eq!(Pagination::from_raw(None, Some("3")).limit, 3);
    }

    #[test]
    fn test_invalid_limit_falls_back_to_default() {
        for raw in ["abc", "0", "-5", ""] {
            assert_eq!(Pagination::from_raw(None, Some(raw)).limit, 10, "{raw}");
        }
    }

    #[test]
    fn test_invalid_page_becomes_first() {
        for raw in ["x", "0", "-2"] {
            assert_eq!(Pagination::from_raw(Some(raw), None).page, 1, "{raw}");
        }
        let p = Pagination::from_raw(Some("3"), Some("4"));
        assert_eq!(p.offset(), 8);
    }

    #[test]
    fn test_offset_never_underflows_or_wraps() {
        assert_eq!(Pagination { page: 0, limit: 10 }.offset(), 0);
        let huge = Pagination::from_raw(Some("1000000000000000000"), None);
        assert_eq!(huge.page, 1_000_000_000_000_000_000);
        assert_eq!(huge.offset(), 9_999_999_999_999_999_990);
        assert!(huge.offset() > i64::MAX as u64);
        assert_eq!(Pagination { page: u64::MAX, limit: 10 }.offset(), u64::MAX);
        assert_eq!(Pagination { page: 2, limit: 0 }.total_pages(5), 5);
    }

    #[test]
    fn test_total_pages() {
        let p = Pagination::default();
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(11), 2);
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        let filter = ContactFilter::new(Some("jo".into()), None, None, None);
        assert!(matches_filter(&contact("1", "John", "Doe"), &filter));
        assert!(matches_filter(&contact("2", "JOHNNY", "Doe"), &filter));
        assert!(!matches_filter(&contact("3", "Jane", "Doe"), &filter));
        assert!(!matches_filter(&contact("4", "Ajo", "Doe"), &filter));

        let accented = ContactFilter::new(Some("é".into()), None, None, None);
        assert!(matches_filter(&contact("5", "Émile", "Zola"), &accented));
    }

    #[test]
    fn test_filter_fields_are_conjunctive() {
        let filter = ContactFilter::new(Some("J".into()), Some("sm".into()), None, None);
        assert!(matches_filter(&contact("1", "John", "Smith"), &filter));
        assert!(!matches_filter(&contact("2", "John", "Doe"), &filter));
    }

    #[test]
    fn test_listing_order() {
        let mut list = vec![
            contact("3", "John", "Zed"),
            contact("1", "Adam", "Young"),
            contact("2", "John", "Abel"),
        ];
        list.sort_by(listing_order);
        let ids: Vec<&str> = list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_prefix_pattern("Jo"), "Jo%");
        assert_eq!(like_prefix_pattern("50%_off\\"), "50\\%\\_off\\\\%");
    }
}
