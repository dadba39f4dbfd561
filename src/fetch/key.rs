use std::fmt;

use crate::domain::{ListingQuery, ResourceKind};

/// Cache identity of one list request.
///
/// Two keys are equal exactly when the resource and the ordered parameter list
/// are equal, which is when the server response is expected to be equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: ResourceKind,
    pub params: Vec<(String, String)>,
}

impl QueryKey {
    #[must_use]
    pub fn new(resource: ResourceKind, query: &ListingQuery) -> Self {
        Self {
            resource,
            params: query.to_params(),
        }
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Page number carried by the key, defaulting to 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.param("page").and_then(|p| p.parse().ok()).unwrap_or(1)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}
