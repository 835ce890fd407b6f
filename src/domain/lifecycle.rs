//! Short lifecycle state machine.
//!
//! `apply` never touches the short it is given: it validates the command
//! against the edge table and the guards, then returns an updated copy with
//! the event describing the change. Persisting the copy is the caller's job.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::assignment::{self, AssignmentRequest};
use super::events::{DomainEvent, EventKind};
use super::models::{Comment, CommentKind, Role, Short, User};
use super::status::{next_status, RejectBackTarget, ShortAction};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub reject_back_to: RejectBackTarget,
    /// When false an assignment may be left unscheduled.
    pub require_deadline: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum Command<'a> {
    Retain,
    Reject,
    Assign(AssignmentRequest<'a>),
    Start,
    Reassign { videaste: &'a User },
    Complete { artifact_url: &'a str },
    Validate,
    RejectBack { feedback: &'a str },
    Publish,
}

impl Command<'_> {
    pub fn action(&self) -> ShortAction {
        match self {
            Command::Retain => ShortAction::Retain,
            Command::Reject => ShortAction::Reject,
            Command::Assign(_) => ShortAction::Assign,
            Command::Start => ShortAction::Start,
            Command::Reassign { .. } => ShortAction::Reassign,
            Command::Complete { .. } => ShortAction::Complete,
            Command::Validate => ShortAction::Validate,
            Command::RejectBack { .. } => ShortAction::RejectBack,
            Command::Publish => ShortAction::Publish,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub short: Short,
    pub event: DomainEvent,
}

pub fn apply(
    short: &Short,
    command: Command<'_>,
    actor: &User,
    policy: &LifecyclePolicy,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    let action = command.action();
    let next = next_status(short.status, action, policy.reject_back_to)?;

    if !actor.is_active() {
        return Err(AppError::InvalidActorRole(format!(
            "User {} is blocked",
            actor.username
        )));
    }

    let mut updated = short.clone();
    let mut involved = vec![actor.id];

    match command {
        Command::Retain | Command::Reject | Command::Validate | Command::Publish => {
            require_admin(actor, action)?;
        }
        Command::Assign(request) => {
            require_admin(actor, action)?;
            assignment::validate_assignment(short, &request, policy, now)?;
            updated.assigned_to = Some(request.videaste.id);
            updated.target_channel_id = Some(request.target.id);
            updated.deadline = request.deadline;
        }
        Command::Reassign { videaste } => {
            require_admin(actor, action)?;
            assignment::ensure_assignable_videaste(videaste)?;
            if let Some(previous) = short.assigned_to {
                push_unique(&mut involved, previous);
            }
            updated.assigned_to = Some(videaste.id);
        }
        Command::Start => {
            require_assignee(short, actor, action)?;
        }
        Command::Complete { artifact_url } => {
            require_assignee(short, actor, action)?;
            let artifact_url = artifact_url.trim();
            if artifact_url.is_empty() {
                return Err(AppError::Validation(
                    "An upload artifact reference is required to complete a short".to_string(),
                ));
            }
            updated.artifact_url = Some(artifact_url.to_string());
        }
        Command::RejectBack { feedback } => {
            require_admin(actor, action)?;
            let feedback = feedback.trim();
            if feedback.is_empty() {
                return Err(AppError::Validation(
                    "A feedback message is required to send a short back".to_string(),
                ));
            }
            updated.comments.push(Comment {
                id: Uuid::new_v4(),
                author_id: actor.id,
                kind: CommentKind::Feedback,
                body: feedback.to_string(),
                created_at: now,
            });
        }
    }

    updated.status = next;
    updated.updated_at = now;
    stamp_entry(&mut updated, now);

    if let Some(assignee) = updated.assigned_to {
        push_unique(&mut involved, assignee);
    }

    let event = DomainEvent {
        kind: EventKind::for_action(action),
        short_id: short.id,
        action,
        old_status: short.status,
        new_status: next,
        user_ids: involved,
        occurred_at: now,
    };

    Ok(Transition {
        short: updated,
        event,
    })
}

/// Entry timestamps are written on first entry only.
fn stamp_entry(short: &mut Short, now: DateTime<Utc>) {
    use super::status::ShortStatus as S;

    let slot = match short.status {
        S::Completed => &mut short.completed_at,
        S::Validated => &mut short.validated_at,
        S::Published => &mut short.published_at,
        S::Rolled | S::Retained | S::Rejected | S::Assigned | S::InProgress => return,
    };
    if slot.is_none() {
        *slot = Some(now);
    }
}

fn require_admin(actor: &User, action: ShortAction) -> Result<(), AppError> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(AppError::InvalidActorRole(format!(
            "{} requires an ADMIN, {} is {}",
            action, actor.username, actor.role
        )))
    }
}

fn require_assignee(short: &Short, actor: &User, action: ShortAction) -> Result<(), AppError> {
    if short.is_worked_on_by(actor) {
        Ok(())
    } else {
        Err(AppError::InvalidActorRole(format!(
            "{} is reserved to the assigned videaste or their assistant",
            action
        )))
    }
}

fn push_unique(ids: &mut Vec<Uuid>, id: Uuid) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}
