//! Query-string synchronisation for listing screens.
//!
//! [`Location`] wraps the screen URL and edits single query parameters while
//! leaving every other parameter, and their order, untouched.

use url::Url;

use crate::domain::error::{RentAdminError, Result};

pub const SEARCH_PARAM: &str = "search";
pub const TAB_PARAM: &str = "tab";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Parses an absolute URL or a path such as `/vehicles?tab=pending`.
    ///
    /// # Errors
    ///
    /// Returns [`RentAdminError::Config`] when the text is not a valid URL.
    pub fn parse(text: &str) -> Result<Self> {
        let base = Url::parse("http://localhost/").map_err(|e| RentAdminError::Config(e.to_string()))?;
        let url = Url::options()
            .base_url(Some(&base))
            .parse(text)
            .map_err(|e| RentAdminError::Config(format!("invalid listing url '{text}': {e}")))?;
        Ok(Self { url })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Path plus query, as shown in the address bar of the console.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(query) if !query.is_empty() => format!("{}?{query}", self.url.path()),
            _ => self.url.path().to_string(),
        }
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Sets `name` to `value`, replacing the first occurrence in place.
    pub fn set_param(&mut self, name: &str, value: &str) {
        let mut replaced = false;
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter_map(|(key, current)| {
                if key != name {
                    return Some((key.into_owned(), current.into_owned()));
                }
                if replaced {
                    return None;
                }
                replaced = true;
                Some((key.into_owned(), value.to_string()))
            })
            .collect();

        self.write_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if !replaced {
            self.url.query_pairs_mut().append_pair(name, value);
        }
    }

    /// Removes every occurrence of `name`. Returns whether anything changed.
    pub fn remove_param(&mut self, name: &str) -> bool {
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| key != name)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        let before = self.url.query_pairs().count();
        if pairs.len() == before {
            return false;
        }
        self.write_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        true
    }

    fn write_pairs<'a>(&mut self, pairs: impl Iterator<Item = (&'a str, &'a str)>) {
        self.url.set_query(None);
        let mut pairs = pairs.peekable();
        if pairs.peek().is_some() {
            self.url.query_pairs_mut().extend_pairs(pairs);
        }
    }
}

/// Whitelisted tabs of a multi-tab listing screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSet {
    tabs: &'static [&'static str],
    default: &'static str,
}

impl TabSet {
    #[must_use]
    pub const fn new(tabs: &'static [&'static str], default: &'static str) -> Self {
        Self { tabs, default }
    }

    #[must_use]
    pub const fn tabs(&self) -> &'static [&'static str] {
        self.tabs
    }

    /// Resolves the requested tab. Returns the tab to show and whether the URL
    /// must be rewritten because the request was missing or not whitelisted.
    #[must_use]
    pub fn resolve(&self, requested: Option<&str>) -> (&'static str, bool) {
        match requested.and_then(|tab| self.tabs.iter().find(|known| **known == tab)) {
            Some(tab) => (tab, false),
            None => (self.default, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_param_keeps_other_params_in_order() {
        let mut location = Location::parse("/vehicles?tab=pending&search=old&x=1").unwrap();
        location.set_param(SEARCH_PARAM, "toyota");
        assert_eq!(location.path_and_query(), "/vehicles?tab=pending&search=toyota&x=1");

        location.set_param("brandId", "7");
        assert_eq!(location.param("brandId").as_deref(), Some("7"));
    }

    #[test]
    fn remove_param_drops_the_query_when_empty() {
        let mut location = Location::parse("/brands?search=kia").unwrap();
        assert!(location.remove_param(SEARCH_PARAM));
        assert!(!location.remove_param(SEARCH_PARAM));
        assert_eq!(location.path_and_query(), "/brands");
    }

    #[test]
    fn values_are_percent_encoded() {
        let mut location = Location::parse("/vehicles").unwrap();
        location.set_param(SEARCH_PARAM, "land cruiser & co");
        assert_eq!(location.param(SEARCH_PARAM).as_deref(), Some("land cruiser & co"));
    }

    #[test]
    fn unknown_tabs_redirect_to_the_default() {
        let tabs = TabSet::new(&["all", "pending"], "all");
        assert_eq!(tabs.resolve(Some("pending")), ("pending", false));
        assert_eq!(tabs.resolve(Some("archived")), ("all", true));
        assert_eq!(tabs.resolve(None), ("all", true));
    }
}
