//! Short lifecycle & assignment service: loads entities from the store, runs
//! the domain rules, and commits the result with a status compare-and-set.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::catalog::VideoCatalog;
use crate::domain::assignment::{self, AssignmentRequest};
use crate::domain::content_type::{compatible_sources, is_compatible};
use crate::domain::lifecycle::{self, Command, LifecyclePolicy, Transition};
use crate::domain::{
    sampler, AdminChannel, Comment, CommentKind, ContentType, PublishStats, Role, Short,
    SourceChannel, User, UserStatus,
};
use crate::errors::AppError;
use crate::notifications::EventSink;
use crate::store::{InsertOutcome, ShortFilter, Store, UpdateOutcome};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSourceChannel {
    pub channel_id: String,
    pub name: String,
    pub content_type: ContentType,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdminChannel {
    pub channel_id: String,
    pub name: String,
    pub content_type: ContentType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignShort {
    pub videaste_id: Uuid,
    pub target_channel_id: Uuid,
    pub deadline: Option<DateTime<Utc>>,
}

pub struct ShortService {
    store: Arc<dyn Store>,
    catalog: Arc<dyn VideoCatalog>,
    events: Arc<dyn EventSink>,
    rng: Mutex<StdRng>,
    policy: LifecyclePolicy,
    roll_max_attempts: u32,
}

fn require_non_empty(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::Validation(format!("{} must not be empty", field)))
    } else {
        Ok(value.to_string())
    }
}

fn require_active_admin(actor: &User) -> Result<(), AppError> {
    if actor.is_active_with_role(Role::Admin) {
        Ok(())
    } else {
        Err(AppError::InvalidActorRole(format!(
            "This operation requires an active ADMIN, {} is {}",
            actor.username, actor.role
        )))
    }
}

impl ShortService {
    pub fn new(
        store: Arc<dyn Store>,
        catalog: Arc<dyn VideoCatalog>,
        events: Arc<dyn EventSink>,
        policy: LifecyclePolicy,
        roll_max_attempts: u32,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            catalog,
            events,
            rng: Mutex::new(rng),
            policy,
            roll_max_attempts: roll_max_attempts.max(1),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub async fn user(&self, id: Uuid) -> Result<User, AppError> {
        self.store
            .user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn source_channel(&self, id: Uuid) -> Result<SourceChannel, AppError> {
        self.store
            .source_channel(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Source channel {} not found", id)))
    }

    pub async fn admin_channel(&self, id: Uuid) -> Result<AdminChannel, AppError> {
        self.store
            .admin_channel(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Publication channel {} not found", id)))
    }

    pub async fn short(&self, id: Uuid) -> Result<Short, AppError> {
        self.store
            .short(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Short {} not found", id)))
    }

    /// Creates the first admin when the user table is empty.
    #[tracing::instrument(name = "Bootstrap admin", skip(self))]
    pub async fn bootstrap_admin(&self, username: &str) -> Result<Option<User>, AppError> {
        if !self.store.list_users().await?.is_empty() {
            return Ok(None);
        }
        let admin = User::new(require_non_empty(username, "username")?, Role::Admin, self.now());
        self.store.insert_user(&admin).await?;
        tracing::info!(user_id = %admin.id, "Bootstrapped admin {}", admin.username);
        Ok(Some(admin))
    }

    // Channels

    #[tracing::instrument(name = "Create source channel", skip(self, actor, input), fields(channel_id = %input.channel_id))]
    pub async fn create_source_channel(
        &self,
        actor: &User,
        input: NewSourceChannel,
    ) -> Result<SourceChannel, AppError> {
        require_active_admin(actor)?;
        let channel = SourceChannel {
            id: Uuid::new_v4(),
            channel_id: require_non_empty(&input.channel_id, "channelId")?,
            name: require_non_empty(&input.name, "name")?,
            content_type: input.content_type,
            profile_image: input.profile_image,
            video_count: 0,
            created_at: self.now(),
        };
        self.store.insert_source_channel(&channel).await?;
        tracing::info!(source_channel_id = %channel.id, "Source channel created");
        Ok(channel)
    }

    pub async fn list_source_channels(&self) -> Result<Vec<SourceChannel>, AppError> {
        self.store.list_source_channels().await
    }

    #[tracing::instrument(name = "Delete source channel", skip(self, actor))]
    pub async fn delete_source_channel(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        require_active_admin(actor)?;
        if self.store.delete_source_channel(id).await? {
            tracing::info!("Source channel and its shorts deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Source channel {} not found", id)))
        }
    }

    /// Shorts rolled from a source, oldest first.
    pub async fn source_history(&self, id: Uuid) -> Result<Vec<Short>, AppError> {
        self.source_channel(id).await?;
        self.store
            .list_shorts(&ShortFilter {
                source_channel_id: Some(id),
                ..ShortFilter::default()
            })
            .await
    }

    #[tracing::instrument(name = "Create publication channel", skip(self, actor, input), fields(channel_id = %input.channel_id))]
    pub async fn create_admin_channel(
        &self,
        actor: &User,
        input: NewAdminChannel,
    ) -> Result<AdminChannel, AppError> {
        require_active_admin(actor)?;
        if !input.content_type.is_publication_eligible() {
            return Err(AppError::Validation(format!(
                "{} is a source-only content type",
                input.content_type
            )));
        }
        let channel = AdminChannel {
            id: Uuid::new_v4(),
            channel_id: require_non_empty(&input.channel_id, "channelId")?,
            name: require_non_empty(&input.name, "name")?,
            content_type: input.content_type,
            stats: PublishStats::default(),
            created_at: self.now(),
        };
        self.store.insert_admin_channel(&channel).await?;
        Ok(channel)
    }

    pub async fn list_admin_channels(&self) -> Result<Vec<AdminChannel>, AppError> {
        self.store.list_admin_channels().await
    }

    /// Source channels whose shorts may be published on the given channel.
    pub async fn compatible_sources(&self, admin_channel_id: Uuid) -> Result<Vec<SourceChannel>, AppError> {
        let target = self.admin_channel(admin_channel_id).await?;
        let accepted = compatible_sources(target.content_type);
        Ok(self
            .store
            .list_source_channels()
            .await?
            .into_iter()
            .filter(|source| accepted.contains(&source.content_type))
            .collect())
    }

    // Users

    #[tracing::instrument(name = "Create user", skip(self, actor, input), fields(username = %input.username, role = %input.role))]
    pub async fn create_user(&self, actor: &User, input: NewUser) -> Result<User, AppError> {
        require_active_admin(actor)?;
        let user = User::new(require_non_empty(&input.username, "username")?, input.role, self.now());
        self.store.insert_user(&user).await?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.store.list_users().await
    }

    #[tracing::instrument(name = "Set user status", skip(self, actor))]
    pub async fn set_user_status(
        &self,
        actor: &User,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<User, AppError> {
        require_active_admin(actor)?;
        if actor.id == user_id && status == UserStatus::Blocked {
            return Err(AppError::Validation("Admins cannot block themselves".to_string()));
        }
        let mut user = self.user(user_id).await?;
        user.status = status;
        self.store.update_user(&user).await?;
        Ok(user)
    }

    #[tracing::instrument(name = "Link assistant", skip(self, actor))]
    pub async fn link_assistant(
        &self,
        actor: &User,
        assistant_id: Uuid,
        videaste_id: Uuid,
    ) -> Result<User, AppError> {
        require_active_admin(actor)?;
        let assistant = self.user(assistant_id).await?;
        let videaste = self.user(videaste_id).await?;
        let current = self.store.assistant_of(videaste_id).await?;

        let linked = assignment::link_assistant(&assistant, &videaste, current.as_ref())?;
        self.store.update_user(&linked).await?;
        tracing::info!("{} now assists {}", linked.username, videaste.username);
        Ok(linked)
    }

    /// Shorts a videaste works on, or those of the videaste an assistant supports.
    pub async fn work_queue(&self, user_id: Uuid) -> Result<Vec<Short>, AppError> {
        let user = self.user(user_id).await?;
        let Some(owner) = assignment::queue_owner(&user) else {
            return Err(AppError::InvalidActorRole(format!(
                "{} has no work queue as {}",
                user.username, user.role
            )));
        };
        self.store
            .list_shorts(&ShortFilter {
                assigned_to: Some(owner),
                ..ShortFilter::default()
            })
            .await
    }

    // Shorts

    pub async fn list_shorts(&self, filter: &ShortFilter) -> Result<Vec<Short>, AppError> {
        self.store.list_shorts(filter).await
    }

    /// Samples a new ROLLED short from the source catalog.
    #[tracing::instrument(name = "Roll short", skip(self, actor))]
    pub async fn roll(&self, actor: &User, source_channel_id: Uuid) -> Result<Short, AppError> {
        require_active_admin(actor)?;
        let source = self.source_channel(source_channel_id).await?;
        let catalog = self.catalog.list_candidate_videos(&source).await?;
        self.store
            .set_video_count(source.id, catalog.len() as i64)
            .await?;

        for attempt in 1..=self.roll_max_attempts {
            let excluded = self.store.claimed_videos(source.id).await?;
            let video = {
                let mut rng = self
                    .rng
                    .lock()
                    .map_err(|_| AppError::Unexpected(anyhow::anyhow!("Roll RNG lock poisoned")))?;
                sampler::roll(&source, &catalog, &excluded, &mut *rng)?
            };

            let short = Short::rolled(source.id, video, self.now());
            match self.store.insert_rolled_short(&short).await? {
                InsertOutcome::Inserted => {
                    tracing::info!(short_id = %short.id, video_id = %short.video.video_id, "Short rolled");
                    return Ok(short);
                }
                InsertOutcome::VideoClaimed => {
                    tracing::warn!(attempt, video_id = %short.video.video_id, "Rolled video was claimed concurrently, re-sampling");
                }
            }
        }

        Err(AppError::Conflict(format!(
            "Could not roll an unclaimed video after {} attempts",
            self.roll_max_attempts
        )))
    }

    async fn commit(&self, before: &Short, transition: Transition) -> Result<Short, AppError> {
        match self.store.update_short(&transition.short, before.status).await? {
            UpdateOutcome::Applied => {
                tracing::info!(
                    short_id = %before.id,
                    from = %transition.event.old_status,
                    to = %transition.event.new_status,
                    "Short transitioned"
                );
                self.events.publish(transition.event);
                Ok(transition.short)
            }
            UpdateOutcome::StatusChanged => Err(AppError::InvalidState(format!(
                "Short {} was modified concurrently",
                before.id
            ))),
            UpdateOutcome::VideoClaimed => Err(AppError::InvalidState(format!(
                "Video {} is already claimed by another short of this source",
                before.video.video_id
            ))),
        }
    }

    async fn run(&self, actor: &User, short_id: Uuid, command: Command<'_>) -> Result<Short, AppError> {
        let short = self.short(short_id).await?;
        let transition = lifecycle::apply(&short, command, actor, &self.policy, self.now())?;
        self.commit(&short, transition).await
    }

    #[tracing::instrument(name = "Retain short", skip(self, actor), fields(actor = %actor.username))]
    pub async fn retain(&self, actor: &User, short_id: Uuid) -> Result<Short, AppError> {
        self.run(actor, short_id, Command::Retain).await
    }

    #[tracing::instrument(name = "Reject short", skip(self, actor), fields(actor = %actor.username))]
    pub async fn reject(&self, actor: &User, short_id: Uuid) -> Result<Short, AppError> {
        self.run(actor, short_id, Command::Reject).await
    }

    #[tracing::instrument(name = "Assign short", skip(self, actor, input), fields(actor = %actor.username, videaste_id = %input.videaste_id))]
    pub async fn assign(&self, actor: &User, short_id: Uuid, input: AssignShort) -> Result<Short, AppError> {
        let short = self.short(short_id).await?;
        let source = self.source_channel(short.source_channel_id).await?;
        let videaste = self.user(input.videaste_id).await?;
        let target = self.admin_channel(input.target_channel_id).await?;

        let request = AssignmentRequest {
            source: &source,
            videaste: &videaste,
            target: &target,
            deadline: input.deadline,
        };
        let transition = assignment::assign(&short, request, actor, &self.policy, self.now())?;
        self.commit(&short, transition).await
    }

    #[tracing::instrument(name = "Reassign short", skip(self, actor), fields(actor = %actor.username))]
    pub async fn reassign(&self, actor: &User, short_id: Uuid, videaste_id: Uuid) -> Result<Short, AppError> {
        let short = self.short(short_id).await?;
        let videaste = self.user(videaste_id).await?;
        let transition = assignment::reassign(&short, &videaste, actor, &self.policy, self.now())?;
        self.commit(&short, transition).await
    }

    #[tracing::instrument(name = "Start short", skip(self, actor), fields(actor = %actor.username))]
    pub async fn start(&self, actor: &User, short_id: Uuid) -> Result<Short, AppError> {
        self.run(actor, short_id, Command::Start).await
    }

    #[tracing::instrument(name = "Complete short", skip(self, actor), fields(actor = %actor.username))]
    pub async fn complete(&self, actor: &User, short_id: Uuid, artifact_url: &str) -> Result<Short, AppError> {
        self.run(actor, short_id, Command::Complete { artifact_url }).await
    }

    #[tracing::instrument(name = "Validate short", skip(self, actor), fields(actor = %actor.username))]
    pub async fn validate(&self, actor: &User, short_id: Uuid) -> Result<Short, AppError> {
        self.run(actor, short_id, Command::Validate).await
    }

    #[tracing::instrument(name = "Send short back", skip(self, actor, feedback), fields(actor = %actor.username))]
    pub async fn reject_back(&self, actor: &User, short_id: Uuid, feedback: &str) -> Result<Short, AppError> {
        self.run(actor, short_id, Command::RejectBack { feedback }).await
    }

    #[tracing::instrument(name = "Publish short", skip(self, actor), fields(actor = %actor.username))]
    pub async fn publish(&self, actor: &User, short_id: Uuid) -> Result<Short, AppError> {
        let short = self.short(short_id).await?;
        if let Some(target_id) = short.target_channel_id {
            let source = self.source_channel(short.source_channel_id).await?;
            let target = self.admin_channel(target_id).await?;
            if !is_compatible(source.content_type, target.content_type) {
                return Err(AppError::IncompatibleContentType {
                    source_type: source.content_type,
                    target_type: target.content_type,
                });
            }
        }
        let transition = lifecycle::apply(&short, Command::Publish, actor, &self.policy, self.now())?;
        self.commit(&short, transition).await
    }

    #[tracing::instrument(name = "Comment short", skip(self, actor, body), fields(actor = %actor.username))]
    pub async fn add_comment(&self, actor: &User, short_id: Uuid, body: &str) -> Result<Comment, AppError> {
        if !actor.is_active() {
            return Err(AppError::InvalidActorRole(format!("User {} is blocked", actor.username)));
        }
        let short = self.short(short_id).await?;
        if actor.role != Role::Admin && !short.is_worked_on_by(actor) {
            return Err(AppError::InvalidActorRole(
                "Only admins and the people working on a short can comment on it".to_string(),
            ));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            author_id: actor.id,
            kind: CommentKind::Note,
            body: require_non_empty(body, "body")?,
            created_at: self.now(),
        };
        if !self.store.add_comment(short.id, &comment).await? {
            return Err(AppError::NotFound(format!("Short {} not found", short.id)));
        }
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::StaticCatalog;
    use crate::domain::{EventKind, ShortStatus};
    use crate::notifications::testing::RecordingSink;
    use crate::store::MemoryStore;
    use chrono::Duration;
    use rand::SeedableRng;
    use std::collections::HashSet;

    struct Harness {
        service: Arc<ShortService>,
        catalog: Arc<StaticCatalog>,
        events: Arc<RecordingSink>,
        admin: User,
        videaste: User,
        assistant: User,
    }

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let catalog = Arc::new(StaticCatalog::default());
        let events = Arc::new(RecordingSink::default());
        let service = Arc::new(ShortService::new(
            store,
            catalog.clone(),
            events.clone(),
            LifecyclePolicy::default(),
            5,
            StdRng::seed_from_u64(2024),
        ));

        let admin = service.bootstrap_admin("root").await.unwrap().unwrap();
        let videaste = service
            .create_user(&admin, NewUser { username: "u1".into(), role: Role::Videaste })
            .await
            .unwrap();
        let assistant = service
            .create_user(&admin, NewUser { username: "a1".into(), role: Role::Assistant })
            .await
            .unwrap();
        let assistant = service
            .link_assistant(&admin, assistant.id, videaste.id)
            .await
            .unwrap();

        Harness {
            service,
            catalog,
            events,
            admin,
            videaste,
            assistant,
        }
    }

    async fn source(h: &Harness, channel_id: &str, content_type: ContentType, videos: &[&str]) -> SourceChannel {
        h.catalog.set(channel_id, videos);
        h.service
            .create_source_channel(
                &h.admin,
                NewSourceChannel {
                    channel_id: channel_id.into(),
                    name: format!("Source {}", channel_id),
                    content_type,
                    profile_image: None,
                },
            )
            .await
            .unwrap()
    }

    async fn target(h: &Harness, channel_id: &str, content_type: ContentType) -> AdminChannel {
        h.service
            .create_admin_channel(
                &h.admin,
                NewAdminChannel {
                    channel_id: channel_id.into(),
                    name: format!("Target {}", channel_id),
                    content_type,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn end_to_end_from_roll_to_publish() {
        let h = harness().await;
        let s = source(&h, "UCs", ContentType::VoSansEdit, &["v1", "v2", "v3"]).await;
        let t = target(&h, "UCt", ContentType::VaSansEdit).await;
        let deadline = Utc::now() + Duration::days(2);

        let short = h.service.roll(&h.admin, s.id).await.unwrap();
        assert_eq!(short.status, ShortStatus::Rolled);
        assert!(["v1", "v2", "v3"].contains(&short.video.video_id.as_str()));

        let short = h.service.retain(&h.admin, short.id).await.unwrap();
        assert_eq!(short.status, ShortStatus::Retained);

        let short = h
            .service
            .assign(
                &h.admin,
                short.id,
                AssignShort { videaste_id: h.videaste.id, target_channel_id: t.id, deadline: Some(deadline) },
            )
            .await
            .unwrap();
        assert_eq!(short.status, ShortStatus::Assigned);
        assert_eq!(short.assigned_to, Some(h.videaste.id));
        assert_eq!(short.target_channel_id, Some(t.id));
        assert_eq!(short.deadline, Some(deadline));

        for _ in 0..20 {
            let again = h.service.roll(&h.admin, s.id).await.unwrap();
            assert_ne!(again.video.video_id, short.video.video_id);
        }

        let queue = h.service.work_queue(h.assistant.id).await.unwrap();
        assert_eq!(queue.iter().map(|s| s.id).collect::<Vec<_>>(), vec![short.id]);

        let short = h.service.start(&h.assistant, short.id).await.unwrap();
        assert_eq!(short.status, ShortStatus::InProgress);
        let short = h.service.complete(&h.videaste, short.id, "https://cdn/cut.mp4").await.unwrap();
        assert_eq!(short.status, ShortStatus::Completed);
        let short = h.service.validate(&h.admin, short.id).await.unwrap();
        assert_eq!(short.status, ShortStatus::Validated);
        let published = h.service.publish(&h.admin, short.id).await.unwrap();
        assert_eq!(published.status, ShortStatus::Published);
        let published_at = published.published_at.expect("stamped");

        let err = h.service.publish(&h.admin, short.id).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidTransition");
        let stored = h.service.short(short.id).await.unwrap();
        assert_eq!(stored.published_at, Some(published_at));

        let kinds: Vec<EventKind> = h.events.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ShortRetained,
                EventKind::ShortAssigned,
                EventKind::ShortStatusChanged,
                EventKind::ShortStatusChanged,
                EventKind::ShortStatusChanged,
                EventKind::ShortStatusChanged,
            ]
        );

        let channel = h.service.admin_channel(t.id).await.unwrap();
        assert_eq!(channel.stats.published_count, 1);
        assert_eq!(h.service.source_channel(s.id).await.unwrap().video_count, 3);
    }

    #[tokio::test]
    async fn rejected_videos_come_back_and_claimed_ones_run_out() {
        let h = harness().await;
        let s = source(&h, "UCone", ContentType::VaAvecEdit, &["only"]).await;

        let first = h.service.roll(&h.admin, s.id).await.unwrap();
        h.service.reject(&h.admin, first.id).await.unwrap();

        let second = h.service.roll(&h.admin, s.id).await.unwrap();
        assert_eq!(second.video.video_id, "only");
        assert_ne!(second.id, first.id);
        h.service.retain(&h.admin, second.id).await.unwrap();

        let err = h.service.roll(&h.admin, s.id).await.unwrap_err();
        assert!(matches!(err, AppError::NoEligibleVideos { source_channel_id } if source_channel_id == s.id));

        let history = h.service.source_history(s.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, ShortStatus::Rejected);
    }

    #[tokio::test]
    async fn catalog_failure_is_not_an_empty_catalog() {
        let h = harness().await;
        let s = source(&h, "UCgone", ContentType::VfSansEdit, &[]).await;
        assert_eq!(h.service.roll(&h.admin, s.id).await.unwrap_err().kind(), "NoEligibleVideos");

        let ghost = h
            .service
            .create_source_channel(
                &h.admin,
                NewSourceChannel {
                    channel_id: "UCmissing".into(),
                    name: "Missing".into(),
                    content_type: ContentType::VfSansEdit,
                    profile_image: None,
                },
            )
            .await
            .unwrap();
        let err = h.service.roll(&h.admin, ghost.id).await.unwrap_err();
        assert_eq!(err.kind(), "CatalogUnavailable");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn only_one_concurrent_decision_wins() {
        let h = harness().await;
        let s = source(&h, "UCrace", ContentType::VaSansEdit, &["a", "b"]).await;
        let short = h.service.roll(&h.admin, s.id).await.unwrap();

        let (retained, rejected) = tokio::join!(
            h.service.retain(&h.admin, short.id),
            h.service.reject(&h.admin, short.id)
        );
        let outcomes = [retained.is_ok(), rejected.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        let loser = retained.err().or(rejected.err()).unwrap();
        assert_eq!(loser.kind(), "InvalidState");

        let err = h.service.retain(&h.admin, short.id).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidState");
    }

    #[tokio::test]
    async fn concurrent_rolls_never_claim_the_same_video_twice() {
        let h = harness().await;
        let s = source(&h, "UCbusy", ContentType::VaSansEdit, &["a", "b", "c", "d"]).await;

        let mut claimed = HashSet::new();
        for _ in 0..4 {
            let (x, y) = tokio::join!(h.service.roll(&h.admin, s.id), h.service.roll(&h.admin, s.id));
            for short in [x.unwrap(), y.unwrap()] {
                if h.service.retain(&h.admin, short.id).await.is_ok() {
                    assert!(claimed.insert(short.video.video_id.clone()));
                }
            }
            if claimed.len() == 4 {
                break;
            }
        }

        let retained = h
            .service
            .list_shorts(&ShortFilter { status: Some(ShortStatus::Retained), ..ShortFilter::default() })
            .await
            .unwrap();
        let videos: HashSet<_> = retained.iter().map(|s| s.video.video_id.clone()).collect();
        assert_eq!(videos.len(), retained.len());
    }

    #[tokio::test]
    async fn assignment_gate_uses_the_source_content_type() {
        let h = harness().await;
        let s = source(&h, "UCvo", ContentType::VoAvecEdit, &["x"]).await;
        let sans = target(&h, "UCsans", ContentType::VfSansEdit).await;
        let avec = target(&h, "UCavec", ContentType::VfAvecEdit).await;
        let short = h.service.roll(&h.admin, s.id).await.unwrap();
        h.service.retain(&h.admin, short.id).await.unwrap();

        let input = |target_channel_id| AssignShort {
            videaste_id: h.videaste.id,
            target_channel_id,
            deadline: None,
        };
        let err = h.service.assign(&h.admin, short.id, input(sans.id)).await.unwrap_err();
        assert_eq!(err.kind(), "IncompatibleContentType");
        assert_eq!(h.service.short(short.id).await.unwrap().status, ShortStatus::Retained);

        let assigned = h.service.assign(&h.admin, short.id, input(avec.id)).await.unwrap();
        assert_eq!(assigned.target_channel_id, Some(avec.id));

        let compatible = h.service.compatible_sources(avec.id).await.unwrap();
        assert_eq!(compatible.iter().map(|c| c.id).collect::<Vec<_>>(), vec![s.id]);
    }

    #[tokio::test]
    async fn blocked_videaste_cannot_receive_work() {
        let h = harness().await;
        let s = source(&h, "UCva", ContentType::VaSansEdit, &["x"]).await;
        let t = target(&h, "UCvat", ContentType::VaSansEdit).await;
        let short = h.service.roll(&h.admin, s.id).await.unwrap();
        h.service.retain(&h.admin, short.id).await.unwrap();

        h.service
            .set_user_status(&h.admin, h.videaste.id, UserStatus::Blocked)
            .await
            .unwrap();
        let err = h
            .service
            .assign(
                &h.admin,
                short.id,
                AssignShort { videaste_id: h.videaste.id, target_channel_id: t.id, deadline: None },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidActorRole");
    }

    #[tokio::test]
    async fn vo_channels_cannot_be_publication_targets() {
        let h = harness().await;
        let err = h
            .service
            .create_admin_channel(
                &h.admin,
                NewAdminChannel {
                    channel_id: "UCvo".into(),
                    name: "VO".into(),
                    content_type: ContentType::VoSansEdit,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "Validation");
    }

    #[tokio::test]
    async fn comments_are_limited_to_people_on_the_short() {
        let h = harness().await;
        let s = source(&h, "UCc", ContentType::VaSansEdit, &["x"]).await;
        let t = target(&h, "UCct", ContentType::VaSansEdit).await;
        let outsider = h
            .service
            .create_user(&h.admin, NewUser { username: "u2".into(), role: Role::Videaste })
            .await
            .unwrap();
        let short = h.service.roll(&h.admin, s.id).await.unwrap();
        h.service.retain(&h.admin, short.id).await.unwrap();
        h.service
            .assign(
                &h.admin,
                short.id,
                AssignShort { videaste_id: h.videaste.id, target_channel_id: t.id, deadline: None },
            )
            .await
            .unwrap();

        h.service.add_comment(&h.assistant, short.id, "on it").await.unwrap();
        h.service.add_comment(&h.admin, short.id, "thanks").await.unwrap();
        let err = h.service.add_comment(&outsider, short.id, "hi").await.unwrap_err();
        assert_eq!(err.kind(), "InvalidActorRole");

        let stored = h.service.short(short.id).await.unwrap();
        let bodies: Vec<_> = stored.comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["on it", "thanks"]);
    }

    #[tokio::test]
    async fn bootstrap_only_runs_on_an_empty_store() {
        let h = harness().await;
        assert!(h.service.bootstrap_admin("second").await.unwrap().is_none());
        assert_eq!(h.service.list_users().await.unwrap().len(), 3);
    }
}
