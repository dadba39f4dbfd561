//! User interface rendering layer with component-based architecture.
//!
//! This module turns listing state into ANSI-styled text through composable
//! rendering components. It provides theme support, pagination with ellipsis
//! compression and fuzzy match highlighting.
//!
//! # Architecture
//!
//! ```text
//! ListingState → compute_viewmodel → ListingViewModel → render → ANSI String
//! ```
//!
//! # Modules
//!
//! - [`viewmodel`]: View model types representing renderable UI state
//! - [`pagination`]: Page strip computation
//! - [`renderer`]: Top-level rendering coordinator
//! - [`components`]: Composable UI component renderers
//! - [`helpers`]: Shared rendering utilities (fitting, highlighting)
//! - [`theme`]: Color scheme definitions and ANSI escape sequence generation

pub mod components;
pub mod helpers;
pub mod pagination;
pub mod renderer;
pub mod theme;
pub mod viewmodel;

pub use pagination::{PageItem, PaginationModel};
pub use renderer::{render, render_viewmodel};
pub use theme::Theme;
pub use viewmodel::{
    DisplayRow, EmptyState, FooterInfo, HeaderInfo, ListingViewModel, ModalView, SearchBarInfo, TabInfo, TableBody,
};
