use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{ShortAction, ShortStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    ShortRetained,
    ShortRejected,
    ShortAssigned,
    ShortReassigned,
    ShortStatusChanged,
}

impl EventKind {
    pub fn for_action(action: ShortAction) -> Self {
        match action {
            ShortAction::Retain => EventKind::ShortRetained,
            ShortAction::Reject => EventKind::ShortRejected,
            ShortAction::Assign => EventKind::ShortAssigned,
            ShortAction::Reassign => EventKind::ShortReassigned,
            ShortAction::Start
            | ShortAction::Complete
            | ShortAction::Validate
            | ShortAction::RejectBack
            | ShortAction::Publish => EventKind::ShortStatusChanged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub kind: EventKind,
    pub short_id: Uuid,
    pub action: ShortAction,
    pub old_status: ShortStatus,
    pub new_status: ShortStatus,
    /// Actor first, then every user the notification concerns.
    pub user_ids: Vec<Uuid>,
    pub occurred_at: DateTime<Utc>,
}
