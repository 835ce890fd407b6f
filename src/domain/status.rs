use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShortStatus {
    Rolled,
    Retained,
    Rejected,
    Assigned,
    InProgress,
    Completed,
    Validated,
    Published,
}

impl ShortStatus {
    pub const ALL: [ShortStatus; 8] = [
        ShortStatus::Rolled,
        ShortStatus::Retained,
        ShortStatus::Rejected,
        ShortStatus::Assigned,
        ShortStatus::InProgress,
        ShortStatus::Completed,
        ShortStatus::Validated,
        ShortStatus::Published,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShortStatus::Rolled => "ROLLED",
            ShortStatus::Retained => "RETAINED",
            ShortStatus::Rejected => "REJECTED",
            ShortStatus::Assigned => "ASSIGNED",
            ShortStatus::InProgress => "IN_PROGRESS",
            ShortStatus::Completed => "COMPLETED",
            ShortStatus::Validated => "VALIDATED",
            ShortStatus::Published => "PUBLISHED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ShortStatus::Rejected | ShortStatus::Published)
    }

    /// A claimed short keeps its video out of future rolls.
    pub fn is_claimed(self) -> bool {
        match self {
            ShortStatus::Rolled | ShortStatus::Rejected => false,
            ShortStatus::Retained
            | ShortStatus::Assigned
            | ShortStatus::InProgress
            | ShortStatus::Completed
            | ShortStatus::Validated
            | ShortStatus::Published => true,
        }
    }

    /// States in which a short carries an assignee and a target channel.
    pub fn has_assignment(self) -> bool {
        match self {
            ShortStatus::Rolled | ShortStatus::Retained | ShortStatus::Rejected => false,
            ShortStatus::Assigned
            | ShortStatus::InProgress
            | ShortStatus::Completed
            | ShortStatus::Validated
            | ShortStatus::Published => true,
        }
    }
}

impl fmt::Display for ShortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShortStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShortStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::Validation(format!("Unknown short status: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortAction {
    Retain,
    Reject,
    Assign,
    Start,
    Reassign,
    Complete,
    Validate,
    RejectBack,
    Publish,
}

impl ShortAction {
    pub const ALL: [ShortAction; 9] = [
        ShortAction::Retain,
        ShortAction::Reject,
        ShortAction::Assign,
        ShortAction::Start,
        ShortAction::Reassign,
        ShortAction::Complete,
        ShortAction::Validate,
        ShortAction::RejectBack,
        ShortAction::Publish,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShortAction::Retain => "retain",
            ShortAction::Reject => "reject",
            ShortAction::Assign => "assign",
            ShortAction::Start => "start",
            ShortAction::Reassign => "reassign",
            ShortAction::Complete => "complete",
            ShortAction::Validate => "validate",
            ShortAction::RejectBack => "reject-back",
            ShortAction::Publish => "publish",
        }
    }
}

impl fmt::Display for ShortAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a completed short goes when an admin sends it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectBackTarget {
    Assigned,
    #[default]
    InProgress,
}

impl RejectBackTarget {
    pub fn status(self) -> ShortStatus {
        match self {
            RejectBackTarget::Assigned => ShortStatus::Assigned,
            RejectBackTarget::InProgress => ShortStatus::InProgress,
        }
    }
}

impl FromStr for RejectBackTarget {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assigned" => Ok(RejectBackTarget::Assigned),
            "in_progress" | "in-progress" => Ok(RejectBackTarget::InProgress),
            other => Err(AppError::Validation(format!(
                "Unknown reject-back target: {}",
                other
            ))),
        }
    }
}

/// Edge table of the lifecycle. Guards are checked elsewhere; this only
/// answers whether `action` exists from `from` and where it leads.
pub fn next_status(
    from: ShortStatus,
    action: ShortAction,
    reject_back: RejectBackTarget,
) -> Result<ShortStatus, AppError> {
    use ShortAction as A;
    use ShortStatus as S;

    match (from, action) {
        (S::Rolled, A::Retain) => Ok(S::Retained),
        (S::Rolled, A::Reject) => Ok(S::Rejected),
        (S::Retained, A::Assign) => Ok(S::Assigned),
        (S::Assigned, A::Start) => Ok(S::InProgress),
        (S::Assigned | S::InProgress, A::Reassign) => Ok(S::Assigned),
        (S::InProgress, A::Complete) => Ok(S::Completed),
        (S::Completed, A::Validate) => Ok(S::Validated),
        (S::Completed, A::RejectBack) => Ok(reject_back.status()),
        (S::Validated, A::Publish) => Ok(S::Published),
        // A short that has already been decided cannot be decided again.
        (_, A::Retain | A::Reject) => Err(AppError::InvalidState(format!(
            "Short is already {}, {} is no longer possible",
            from, action
        ))),
        (_, A::Assign) => Err(AppError::InvalidState(format!(
            "Only RETAINED shorts can be assigned, short is {}",
            from
        ))),
        _ => Err(AppError::InvalidTransition { from, action }),
    }
}
