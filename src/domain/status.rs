//! Approval workflow states and the client-side transition rules.
//!
//! Vehicles and companies carry an [`ApprovalStatus`] that admins advance from
//! the listing screens. [`validate_transition`] runs before any status request
//! is sent; a violation becomes a toast and the request is dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{RentAdminError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    UnderReview,
}

impl ApprovalStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::UnderReview];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::UnderReview => "UNDER_REVIEW",
        }
    }

    /// Lowercase, dash-separated name used for tab identifiers.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::UnderReview => "under-review",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.slug() == slug)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = RentAdminError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| RentAdminError::validation("approvalStatus", format!("unknown status '{s}'")))
    }
}

/// Which review a record is going through.
///
/// A first-time registration can only be approved or rejected. A listing whose
/// edits are awaiting review may additionally be parked in `UNDER_REVIEW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFlow {
    Registration,
    Modification,
}

/// Body of the status-update endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: String,
    pub approval_status: ApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl StatusChange {
    /// Builds a change, dropping a blank rejection reason.
    pub fn new(id: impl Into<String>, approval_status: ApprovalStatus, rejection_reason: Option<String>) -> Self {
        Self {
            id: id.into(),
            approval_status,
            rejection_reason: rejection_reason
                .map(|reason| reason.trim().to_string())
                .filter(|reason| !reason.is_empty()),
        }
    }
}

/// Checks a requested status change against the approval rules.
///
/// # Errors
///
/// Returns [`RentAdminError::BusinessRule`] when:
/// - the target equals the current status
/// - the target is `PENDING`
/// - the target is `REJECTED` without a rejection reason
/// - the target is `UNDER_REVIEW` outside the modification flow
///
/// # Examples
///
/// ```
/// use rentadmin::domain::{validate_transition, ApprovalStatus, ReviewFlow, StatusChange};
///
/// let change = StatusChange::new("v-1", ApprovalStatus::Rejected, None);
/// assert!(validate_transition(ApprovalStatus::Pending, &change, ReviewFlow::Registration).is_err());
///
/// let change = StatusChange::new("v-1", ApprovalStatus::Approved, None);
/// assert!(validate_transition(ApprovalStatus::Pending, &change, ReviewFlow::Registration).is_ok());
/// ```
pub fn validate_transition(current: ApprovalStatus, change: &StatusChange, flow: ReviewFlow) -> Result<()> {
    let target = change.approval_status;

    if target == current {
        return Err(RentAdminError::BusinessRule(format!("status is already {current}")));
    }

    match target {
        ApprovalStatus::Pending => Err(RentAdminError::BusinessRule(
            "cannot revert to PENDING".to_string(),
        )),
        ApprovalStatus::Rejected if change.rejection_reason.is_none() => Err(RentAdminError::BusinessRule(
            "rejection reason is required when status is REJECTED".to_string(),
        )),
        ApprovalStatus::UnderReview if flow == ReviewFlow::Registration => Err(RentAdminError::BusinessRule(
            "UNDER_REVIEW is only available for modified listings".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(target: ApprovalStatus, reason: Option<&str>) -> StatusChange {
        StatusChange::new("id-1", target, reason.map(str::to_string))
    }

    #[test]
    fn rejection_needs_a_reason() {
        let blank = change(ApprovalStatus::Rejected, Some("   "));
        assert!(validate_transition(ApprovalStatus::Pending, &blank, ReviewFlow::Registration).is_err());

        let with_reason = change(ApprovalStatus::Rejected, Some("blurry documents"));
        assert!(validate_transition(ApprovalStatus::Pending, &with_reason, ReviewFlow::Registration).is_ok());
    }

    #[test]
    fn pending_is_never_a_target() {
        let back = change(ApprovalStatus::Pending, None);
        for current in [ApprovalStatus::Approved, ApprovalStatus::Rejected, ApprovalStatus::UnderReview] {
            assert!(validate_transition(current, &back, ReviewFlow::Modification).is_err());
        }
    }

    #[test]
    fn under_review_depends_on_flow() {
        let review = change(ApprovalStatus::UnderReview, None);
        assert!(validate_transition(ApprovalStatus::Approved, &review, ReviewFlow::Registration).is_err());
        assert!(validate_transition(ApprovalStatus::Approved, &review, ReviewFlow::Modification).is_ok());
    }

    #[test]
    fn unchanged_status_is_rejected() {
        let same = change(ApprovalStatus::Approved, None);
        let err = validate_transition(ApprovalStatus::Approved, &same, ReviewFlow::Modification).unwrap_err();
        assert_eq!(err.to_string(), "status is already APPROVED");
    }

    #[test]
    fn status_change_serializes_like_the_api_expects() {
        let json = serde_json::to_value(change(ApprovalStatus::UnderReview, None)).unwrap();
        assert_eq!(json, serde_json::json!({"id": "id-1", "approvalStatus": "UNDER_REVIEW"}));
    }

    #[test]
    fn parses_slugs_and_wire_names() {
        assert_eq!("under-review".parse::<ApprovalStatus>().ok(), Some(ApprovalStatus::UnderReview));
        assert_eq!("APPROVED".parse::<ApprovalStatus>().ok(), Some(ApprovalStatus::Approved));
        assert_eq!(ApprovalStatus::from_slug("rejected"), Some(ApprovalStatus::Rejected));
    }
}
