//! Local persisted state: region selection and upload bookkeeping.
//!
//! # Modules
//!
//! - `backend`: [`Storage`] key-value trait and the in-memory implementation
//! - `json`: JSON file-based storage implementation
//! - `models`: Persisted record types
//! - `selection`: [`SelectionProvider`], sole owner of the region selection
//! - `uploads`: [`UploadTracker`], per-field pending upload records

pub mod backend;
pub mod json;
pub mod models;
pub mod selection;
pub mod uploads;

pub use backend::{MemoryStorage, Storage};
pub use json::JsonStorage;
pub use models::{RegionRef, Selection, UploadRecord};
pub use selection::{RegionSlot, SelectionProvider};
pub use uploads::UploadTracker;
