//! Listing query parameters and the paginated result envelope.
//!
//! A [`ListingQuery`] is the transient view state of one listing screen. It is
//! turned into an ordered parameter list by [`ListingQuery::to_params`], which
//! is both the cache key tuple and the backend query string.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::RentAdminError;

/// Sort direction accepted by every list endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Wire representation (`ASC` / `DESC`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = RentAdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(RentAdminError::validation(
                "sortOrder",
                format!("unknown sort order '{other}'"),
            )),
        }
    }
}

/// Page sizes offered by the listing screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageLimit {
    #[default]
    Ten,
    Fifteen,
    Twenty,
    Thirty,
}

impl PageLimit {
    pub const ALL: [Self; 4] = [Self::Ten, Self::Fifteen, Self::Twenty, Self::Thirty];

    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Ten => 10,
            Self::Fifteen => 15,
            Self::Twenty => 20,
            Self::Thirty => 30,
        }
    }
}

impl TryFrom<u32> for PageLimit {
    type Error = RentAdminError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|limit| limit.value() == value)
            .ok_or_else(|| {
                RentAdminError::validation("limit", format!("page size {value} is not one of 10/15/20/30"))
            })
    }
}

impl From<PageLimit> for u32 {
    fn from(limit: PageLimit) -> Self {
        limit.value()
    }
}

impl fmt::Display for PageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Pagination, sort, search and filter state of one listing screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// One-based page number. Never clamped against the result size.
    pub page: u32,
    pub limit: PageLimit,
    pub sort_order: SortOrder,
    /// Committed (debounced) search term. `None` means no search.
    pub search_term: Option<String>,
    /// Resource-specific filters, ordered by key.
    pub filters: BTreeMap<String, String>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: PageLimit::default(),
            sort_order: SortOrder::default(),
            search_term: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListingQuery {
    /// Ordered `(name, value)` pairs that determine the server response.
    ///
    /// Order: `page`, `limit`, `sortOrder`, `search` (when set), then filters
    /// by key. Empty filter values are skipped.
    ///
    /// ```
    /// use rentadmin::domain::ListingQuery;
    ///
    /// let mut query = ListingQuery::default();
    /// query.search_term = Some("toyota".to_string());
    /// query.filters.insert("brandId".to_string(), "7".to_string());
    ///
    /// let params = query.to_params();
    /// assert_eq!(params[0], ("page".to_string(), "1".to_string()));
    /// assert_eq!(params[3], ("search".to_string(), "toyota".to_string()));
    /// assert_eq!(params[4], ("brandId".to_string(), "7".to_string()));
    /// ```
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("sortOrder".to_string(), self.sort_order.to_string()),
        ];
        if let Some(term) = &self.search_term {
            params.push(("search".to_string(), term.clone()));
        }
        params.extend(
            self.filters
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        params
    }

    /// Returns the value of a filter if it is set and non-empty.
    #[must_use]
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Paginated list envelope returned by every list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteListResult<T> {
    pub list: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_number_of_pages: u32,
}

impl<T> RemoteListResult<T> {
    /// Builds an envelope, deriving `total_number_of_pages` from `total`.
    #[must_use]
    pub fn new(list: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        Self {
            list,
            page,
            limit,
            total,
            total_number_of_pages: total_pages(total, limit),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Converts every item, keeping the paging metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<RemoteListResult<U>, E> {
        let list = self.list.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(RemoteListResult {
            list,
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_number_of_pages: self.total_number_of_pages,
        })
    }
}

/// Number of pages needed to show `total` items `limit` at a time.
///
/// ```
/// assert_eq!(rentadmin::domain::listing::total_pages(47, 20), 3);
/// assert_eq!(rentadmin::domain::listing::total_pages(0, 20), 0);
/// ```
#[must_use]
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!("asc".parse::<SortOrder>().ok(), Some(SortOrder::Asc));
        assert_eq!(" DESC ".parse::<SortOrder>().ok(), Some(SortOrder::Desc));
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn page_limit_only_accepts_offered_sizes() {
        assert_eq!(PageLimit::try_from(20).ok(), Some(PageLimit::Twenty));
        assert!(PageLimit::try_from(25).is_err());
    }

    #[test]
    fn params_skip_empty_filters_and_missing_search() {
        let mut query = ListingQuery::default();
        query.filters.insert("stateId".to_string(), String::new());
        query.filters.insert("brandId".to_string(), "3".to_string());

        let names: Vec<String> = query.to_params().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["page", "limit", "sortOrder", "brandId"]);
    }

    #[test]
    fn envelope_uses_camel_case_on_the_wire() {
        let json = r#"{"list":[1,2],"page":2,"limit":20,"total":47,"totalNumberOfPages":3}"#;
        let parsed: RemoteListResult<u8> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, RemoteListResult::new(vec![1, 2], 2, 20, 47));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(41, 20), 3);
        assert_eq!(total_pages(5, 0), 0);
    }
}
