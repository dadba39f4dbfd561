//! Error types for the admin listing layer.
//!
//! [`RentAdminError`] covers everything that can fail outside the network
//! boundary (configuration, local storage, theme loading, form validation and
//! approval business rules). Transport failures live in
//! [`FetchError`](crate::fetch::FetchError) and are wrapped here when they need
//! to cross into crate-level results.

use thiserror::Error;

use crate::fetch::FetchError;

/// The main error type for rentadmin operations.
///
/// # Examples
///
/// ```
/// use rentadmin::RentAdminError;
///
/// fn require_reason(reason: &str) -> Result<(), RentAdminError> {
///     if reason.trim().is_empty() {
///         return Err(RentAdminError::BusinessRule(
///             "rejection reason is required when status is REJECTED".to_string(),
///         ));
///     }
///     Ok(())
/// }
///
/// assert!(require_reason("  ").is_err());
/// ```
#[derive(Debug, Error)]
pub enum RentAdminError {
    /// Reading or writing the local persisted store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Theme file could not be read or parsed.
    #[error("Theme error: {0}")]
    Theme(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A form field was rejected before submission.
    ///
    /// Surfaced inline next to the offending field; no request is sent.
    #[error("{field}: {message}")]
    Validation {
        /// Name of the offending form field.
        field: String,
        /// Human-readable reason.
        message: String,
    },

    /// A client-side business rule rejected the action.
    ///
    /// Surfaced as a toast; no request is sent.
    #[error("{0}")]
    BusinessRule(String),

    /// The backend call failed after retries.
    #[error("API error: {0}")]
    Api(#[from] FetchError),
}

impl RentAdminError {
    /// Builds a [`RentAdminError::Validation`] for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for rentadmin operations.
pub type Result<T> = std::result::Result<T, RentAdminError>;
