//! Records persisted in local storage.

use serde::{Deserialize, Serialize};

/// A country or state picked in the region selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRef {
    pub id: String,
    pub name: String,
}

impl RegionRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Immutable snapshot of the region selection handed to listing screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected_state: Option<RegionRef>,
    pub selected_parent_state: Option<RegionRef>,
    pub selected_country: Option<RegionRef>,
    pub parent_state: Option<RegionRef>,
    /// Country code used by the dashboard shell.
    pub app_country: Option<String>,
}

impl Selection {
    /// Filter keys a selection can supply, whether or not it currently does.
    pub const FILTER_KEYS: [&'static str; 1] = ["stateId"];

    /// Filter defaults this selection supplies to listings. Only keys a
    /// resource requires are applied.
    #[must_use]
    pub fn filter_defaults(&self) -> Vec<(&'static str, String)> {
        let mut defaults = Vec::new();
        if let Some(state) = &self.selected_state {
            defaults.push(("stateId", state.id.clone()));
        }
        defaults
    }
}

/// Files uploaded for one form field that are not yet committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Uploaded during this edit; orphaned if the form is abandoned.
    #[serde(default)]
    pub add: Vec<String>,
    /// Previously saved files the user removed; deleted once the form is saved.
    #[serde(default)]
    pub delete: Vec<String>,
}

impl UploadRecord {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.delete.is_empty()
    }
}
