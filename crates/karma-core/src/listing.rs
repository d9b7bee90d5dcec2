//! Client-side search, status filtering and pagination.
//!
//! Lists are always recomputed from the full in-memory collection; nothing
//! here caches.

use std::fmt;
use std::str::FromStr;

/// Default page size for list views.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A record that can be matched against a free-text query.
pub trait Searchable {
    /// Returns true if the record matches `query`.
    ///
    /// `query` is already trimmed and lowercased; an empty query never reaches
    /// this method.
    fn matches(&self, query: &str) -> bool;
}

/// Case-insensitive substring helper for [`Searchable`] impls.
pub fn contains_ci(haystack: &str, query: &str) -> bool {
    haystack.to_lowercase().contains(query)
}

/// Returns the records matching `query`. An empty query matches everything.
pub fn search<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let query = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| query.is_empty() || item.matches(&query))
        .collect()
}

/// `all` or one specific status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter<S> {
    #[default]
    All,
    Only(S),
}

impl<S: PartialEq> StatusFilter<S> {
    pub fn accepts(&self, status: &S) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl<S: FromStr> FromStr for StatusFilter<S> {
    type Err = S::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

impl<S: fmt::Display> fmt::Display for StatusFilter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => status.fmt(f),
        }
    }
}

/// One page of a filtered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually shown (clamped into range).
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    /// 0-based index of the first item shown.
    pub start: usize,
}

impl<T> Page<T> {
    /// `Showing a-b of n <noun>`, with `a` = 0 for an empty list.
    pub fn summary(&self, noun: &str) -> String {
        let first = if self.total == 0 { 0 } else { self.start + 1 };
        let last = self.start + self.items.len();
        format!("Showing {first}-{last} of {} {noun}", self.total)
    }
}

/// Slices `items` into the requested 1-based page.
///
/// Page 0 is treated as page 1 and pages past the end show the last page.
/// `per_page` of 0 falls back to [`DEFAULT_PAGE_SIZE`].
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = if per_page == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        per_page
    };
    let total = items.len();
    let total_pages = total.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));
    let start = ((page - 1) * per_page).min(total);

    let items = items.into_iter().skip(start).take(per_page).collect();
    Page {
        items,
        page,
        total_pages,
        total,
        start,
    }
}
