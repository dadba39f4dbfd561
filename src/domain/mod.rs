//! Domain layer for the rental admin listings.
//!
//! Plain data and rules with no I/O: the listing query and result envelope,
//! the managed resource kinds with their row DTOs, and the approval workflow.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`listing`]: Query parameters and the paginated envelope
//! - [`resources`]: Resource kinds, row DTOs and table columns
//! - [`status`]: Approval statuses and transition rules
//! - [`offer`]: Countdown text for time-limited offers
//!
//! # Examples
//!
//! ```
//! use rentadmin::domain::{ListingQuery, ResourceKind};
//!
//! let query = ListingQuery::default();
//! assert_eq!(query.page, 1);
//! assert_eq!(ResourceKind::Vehicles.slug(), "vehicles");
//! ```

pub mod error;
pub mod listing;
pub mod offer;
pub mod resources;
pub mod status;

pub use error::{RentAdminError, Result};
pub use listing::{ListingQuery, PageLimit, RemoteListResult, SortOrder};
pub use offer::offer_countdown;
pub use resources::{CellContext, ColumnHeader, Record, ResourceKind, Tabular};
pub use status::{validate_transition, ApprovalStatus, ReviewFlow, StatusChange};
