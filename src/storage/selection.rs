//! Country and state selection shared by every listing screen.
//!
//! [`SelectionProvider`] is the only writer of the selection keys. Screens
//! receive an immutable [`Selection`] snapshot and never touch storage.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::error::{RentAdminError, Result};
use crate::storage::backend::Storage;
use crate::storage::models::{RegionRef, Selection};

pub const SELECTED_STATE_KEY: &str = "selectedState";
pub const SELECTED_PARENT_STATE_KEY: &str = "selectedParentState";
pub const SELECTED_COUNTRY_KEY: &str = "selectedCountry";
pub const PARENT_STATE_KEY: &str = "parentState";
pub const APP_COUNTRY_KEY: &str = "appCountry";

/// Which region slot to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSlot {
    State,
    ParentState,
    Country,
    LegacyParentState,
}

impl RegionSlot {
    const fn key(self) -> &'static str {
        match self {
            Self::State => SELECTED_STATE_KEY,
            Self::ParentState => SELECTED_PARENT_STATE_KEY,
            Self::Country => SELECTED_COUNTRY_KEY,
            Self::LegacyParentState => PARENT_STATE_KEY,
        }
    }
}

pub struct SelectionProvider {
    storage: Box<dyn Storage>,
    current: Selection,
}

impl SelectionProvider {
    /// Reads the persisted selection.
    ///
    /// Entries that fail to parse are logged and treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the store itself cannot be read.
    pub fn load(storage: Box<dyn Storage>) -> Result<Self> {
        let current = Selection {
            selected_state: read_json(storage.as_ref(), SELECTED_STATE_KEY)?,
            selected_parent_state: read_json(storage.as_ref(), SELECTED_PARENT_STATE_KEY)?,
            selected_country: read_json(storage.as_ref(), SELECTED_COUNTRY_KEY)?,
            parent_state: read_json(storage.as_ref(), PARENT_STATE_KEY)?,
            app_country: read_json(storage.as_ref(), APP_COUNTRY_KEY)?,
        };
        tracing::debug!(selection = ?current, "selection loaded");
        Ok(Self { storage, current })
    }

    #[must_use]
    pub fn snapshot(&self) -> Selection {
        self.current.clone()
    }

    /// Sets or clears one region slot and returns the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    pub fn set_region(&mut self, slot: RegionSlot, region: Option<RegionRef>) -> Result<Selection> {
        write_json(self.storage.as_mut(), slot.key(), region.as_ref())?;
        let target = match slot {
            RegionSlot::State => &mut self.current.selected_state,
            RegionSlot::ParentState => &mut self.current.selected_parent_state,
            RegionSlot::Country => &mut self.current.selected_country,
            RegionSlot::LegacyParentState => &mut self.current.parent_state,
        };
        *target = region;
        Ok(self.snapshot())
    }

    /// Sets or clears the flat country code.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    pub fn set_app_country(&mut self, code: Option<String>) -> Result<Selection> {
        let code = code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        write_json(self.storage.as_mut(), APP_COUNTRY_KEY, code.as_ref())?;
        self.current.app_country = code;
        Ok(self.snapshot())
    }
}

fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Result<Option<T>> {
    let Some(value) = storage.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "ignoring unreadable selection entry");
            Ok(None)
        }
    }
}

fn write_json<T: Serialize>(storage: &mut dyn Storage, key: &str, value: Option<&T>) -> Result<()> {
    match value {
        Some(value) => {
            let json: Value = serde_json::to_value(value)
                .map_err(|e| RentAdminError::Storage(format!("failed to serialize {key}: {e}")))?;
            storage.set(key, json)
        }
        None => storage.remove(key).map(drop),
    }
}
