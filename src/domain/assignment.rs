//! Assignment resolver: binds a retained short to a videaste and a
//! publication channel, and manages the assistant → videaste relation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::content_type::is_compatible;
use super::lifecycle::{self, Command, LifecyclePolicy, Transition};
use super::models::{AdminChannel, Role, Short, SourceChannel, User};
use super::status::ShortStatus;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy)]
pub struct AssignmentRequest<'a> {
    pub source: &'a SourceChannel,
    pub videaste: &'a User,
    pub target: &'a AdminChannel,
    pub deadline: Option<DateTime<Utc>>,
}

pub fn assign(
    short: &Short,
    request: AssignmentRequest<'_>,
    admin: &User,
    policy: &LifecyclePolicy,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    lifecycle::apply(short, Command::Assign(request), admin, policy, now)
}

/// Hands the short to another videaste without touching target or deadline.
pub fn reassign(
    short: &Short,
    videaste: &User,
    admin: &User,
    policy: &LifecyclePolicy,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    lifecycle::apply(short, Command::Reassign { videaste }, admin, policy, now)
}

pub(crate) fn validate_assignment(
    short: &Short,
    request: &AssignmentRequest<'_>,
    policy: &LifecyclePolicy,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if short.status != ShortStatus::Retained {
        return Err(AppError::InvalidState(format!(
            "Only RETAINED shorts can be assigned, short is {}",
            short.status
        )));
    }
    if short.source_channel_id != request.source.id {
        return Err(AppError::Validation(format!(
            "Short {} does not belong to source channel {}",
            short.id, request.source.id
        )));
    }
    if !is_compatible(request.source.content_type, request.target.content_type) {
        return Err(AppError::IncompatibleContentType {
            source_type: request.source.content_type,
            target_type: request.target.content_type,
        });
    }
    ensure_assignable_videaste(request.videaste)?;
    ensure_deadline(request.deadline, policy, now)
}

pub(crate) fn ensure_assignable_videaste(user: &User) -> Result<(), AppError> {
    if user.is_active_with_role(Role::Videaste) {
        Ok(())
    } else {
        Err(AppError::InvalidActorRole(format!(
            "{} is not an active VIDEASTE ({} / {})",
            user.username,
            user.role,
            user.status.as_str()
        )))
    }
}

fn ensure_deadline(
    deadline: Option<DateTime<Utc>>,
    policy: &LifecyclePolicy,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    match deadline {
        Some(deadline) if deadline <= now => Err(AppError::InvalidDeadline(format!(
            "Deadline {} is not in the future",
            deadline.to_rfc3339()
        ))),
        Some(_) => Ok(()),
        None if policy.require_deadline => Err(AppError::InvalidDeadline(
            "A deadline is required for assignments".to_string(),
        )),
        None => Ok(()),
    }
}

/// Links `assistant` to `videaste`, replacing any previous link.
///
/// `current` is the assistant the videaste already has, if any. A videaste
/// keeps at most one assistant.
pub fn link_assistant(
    assistant: &User,
    videaste: &User,
    current: Option<&User>,
) -> Result<User, AppError> {
    if assistant.role != Role::Assistant {
        return Err(AppError::InvalidActorRole(format!(
            "{} is {}, only ASSISTANT users can be linked",
            assistant.username, assistant.role
        )));
    }
    ensure_assignable_videaste(videaste)?;

    if let Some(current) = current {
        if current.id != assistant.id {
            return Err(AppError::Conflict(format!(
                "{} already has {} as assistant",
                videaste.username, current.username
            )));
        }
    }

    let mut linked = assistant.clone();
    linked.assistant_of = Some(videaste.id);
    Ok(linked)
}

/// Videaste whose queue `user` sees. Admins have no queue of their own.
pub fn queue_owner(user: &User) -> Option<Uuid> {
    match user.role {
        Role::Videaste => Some(user.id),
        Role::Assistant => user.assistant_of,
        Role::Admin => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content_type::ContentType;
    use crate::domain::events::EventKind;
    use crate::domain::fixtures::Fixture;
    use crate::domain::models::UserStatus;
    use chrono::Duration;

    fn retained(fx: &Fixture) -> Short {
        let mut short = fx.short.clone();
        short.status = ShortStatus::Retained;
        short
    }

    fn request<'a>(fx: &'a Fixture, target: &'a AdminChannel) -> AssignmentRequest<'a> {
        AssignmentRequest {
            source: &fx.source,
            videaste: &fx.videaste,
            target,
            deadline: Some(fx.now + Duration::days(1)),
        }
    }

    #[test]
    fn compatibility_gate() {
        let fx = Fixture::new(ContentType::VoAvecEdit, ContentType::VfSansEdit);
        let short = retained(&fx);
        let policy = LifecyclePolicy::default();

        let err = assign(&short, request(&fx, &fx.target), &fx.admin, &policy, fx.now).unwrap_err();
        assert!(matches!(
            err,
            AppError::IncompatibleContentType {
                source_type: ContentType::VoAvecEdit,
                target_type: ContentType::VfSansEdit
            }
        ));

        let mut avec = fx.target.clone();
        avec.content_type = ContentType::VfAvecEdit;
        let done = assign(&short, request(&fx, &avec), &fx.admin, &policy, fx.now).unwrap();
        assert_eq!(done.short.status, ShortStatus::Assigned);
        assert_eq!(done.short.assigned_to, Some(fx.videaste.id));
        assert_eq!(done.short.target_channel_id, Some(avec.id));
        assert_eq!(done.event.kind, EventKind::ShortAssigned);
        assert_eq!(done.event.user_ids, vec![fx.admin.id, fx.videaste.id]);
    }

    #[test]
    fn only_retained_shorts_are_assignable() {
        let fx = Fixture::new(ContentType::VaSansEdit, ContentType::VaSansEdit);
        let policy = LifecyclePolicy::default();
        for status in [ShortStatus::Rolled, ShortStatus::Rejected, ShortStatus::Assigned] {
            let mut short = fx.short.clone();
            short.status = status;
            let err = assign(&short, request(&fx, &fx.target), &fx.admin, &policy, fx.now).unwrap_err();
            assert_eq!(err.kind(), "InvalidState", "{}", status);
        }
    }

    #[test]
    fn assignee_must_be_an_active_videaste() {
        let fx = Fixture::new(ContentType::VaSansEdit, ContentType::VaSansEdit);
        let short = retained(&fx);
        let policy = LifecyclePolicy::default();

        let mut blocked = fx.videaste.clone();
        blocked.status = UserStatus::Blocked;
        for candidate in [&blocked, &fx.assistant, &fx.admin] {
            let req = AssignmentRequest {
                videaste: candidate,
                ..request(&fx, &fx.target)
            };
            let err = assign(&short, req, &fx.admin, &policy, fx.now).unwrap_err();
            assert_eq!(err.kind(), "InvalidActorRole");
        }
    }

    #[test]
    fn deadline_policy() {
        let fx = Fixture::new(ContentType::VaSansEdit, ContentType::VaSansEdit);
        let short = retained(&fx);
        let lenient = LifecyclePolicy::default();
        let strict = LifecyclePolicy {
            require_deadline: true,
            ..LifecyclePolicy::default()
        };

        let past = AssignmentRequest {
            deadline: Some(fx.now - Duration::minutes(1)),
            ..request(&fx, &fx.target)
        };
        assert_eq!(
            assign(&short, past, &fx.admin, &lenient, fx.now).unwrap_err().kind(),
            "InvalidDeadline"
        );

        let open = AssignmentRequest {
            deadline: None,
            ..request(&fx, &fx.target)
        };
        assert!(assign(&short, open, &fx.admin, &lenient, fx.now).is_ok());
        assert_eq!(
            assign(&short, open, &fx.admin, &strict, fx.now).unwrap_err().kind(),
            "InvalidDeadline"
        );
    }

    #[test]
    fn reassign_works_from_assigned_and_in_progress_only() {
        let fx = Fixture::new(ContentType::VaSansEdit, ContentType::VaSansEdit);
        let policy = LifecyclePolicy::default();
        for status in ShortStatus::ALL {
            let mut short = fx.short.clone();
            short.status = status;
            short.assigned_to = Some(fx.videaste.id);
            short.target_channel_id = Some(fx.target.id);
            let result = reassign(&short, &fx.other_videaste, &fx.admin, &policy, fx.now);
            let allowed = matches!(status, ShortStatus::Assigned | ShortStatus::InProgress);
            assert_eq!(result.is_ok(), allowed, "{}", status);
        }
    }

    #[test]
    fn linking_assistants() {
        let fx = Fixture::new(ContentType::VaSansEdit, ContentType::VaSansEdit);
        let now = fx.now;
        let newcomer = User::new("newcomer", Role::Assistant, now);

        let err = link_assistant(&newcomer, &fx.videaste, Some(&fx.assistant)).unwrap_err();
        assert_eq!(err.kind(), "Conflict");

        let linked = link_assistant(&newcomer, &fx.other_videaste, None).unwrap();
        assert_eq!(linked.assistant_of, Some(fx.other_videaste.id));

        // Moving an assistant overwrites the previous relation.
        let moved = link_assistant(&fx.assistant, &fx.other_videaste, None).unwrap();
        assert_eq!(moved.assistant_of, Some(fx.other_videaste.id));

        let relinked = link_assistant(&fx.assistant, &fx.videaste, Some(&fx.assistant)).unwrap();
        assert_eq!(relinked.assistant_of, Some(fx.videaste.id));

        assert_eq!(
            link_assistant(&fx.videaste, &fx.other_videaste, None).unwrap_err().kind(),
            "InvalidActorRole"
        );
    }

    #[test]
    fn queue_owner_follows_the_back_reference() {
        let fx = Fixture::new(ContentType::VaSansEdit, ContentType::VaSansEdit);
        assert_eq!(queue_owner(&fx.videaste), Some(fx.videaste.id));
        assert_eq!(queue_owner(&fx.assistant), Some(fx.videaste.id));
        assert_eq!(queue_owner(&fx.admin), None);
    }
}
