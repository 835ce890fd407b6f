use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InsertOutcome, ShortFilter, Store, UpdateOutcome};
use crate::domain::{AdminChannel, Comment, Role, Short, ShortStatus, SourceChannel, User};
use crate::errors::AppError;

#[derive(Debug, Default)]
struct Tables {
    source_channels: HashMap<Uuid, SourceChannel>,
    admin_channels: HashMap<Uuid, AdminChannel>,
    users: HashMap<Uuid, User>,
    shorts: HashMap<Uuid, Short>,
}

impl Tables {
    fn video_claimed(&self, short: &Short) -> bool {
        self.shorts.values().any(|other| {
            other.id != short.id
                && other.source_channel_id == short.source_channel_id
                && other.video.video_id == short.video.video_id
                && other.status.is_claimed()
        })
    }

    fn with_stats(&self, channel: &AdminChannel) -> AdminChannel {
        let mut channel = channel.clone();
        let id = channel.id;
        let published = self.shorts.values().filter(|short| {
            short.target_channel_id == Some(id) && short.status == ShortStatus::Published
        });
        channel.stats.published_count = 0;
        channel.stats.last_published_at = None;
        for short in published {
            channel.stats.published_count += 1;
            channel.stats.last_published_at = channel.stats.last_published_at.max(short.published_at);
        }
        channel
    }
}

/// Single-lock store; every method is one critical section.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_source_channel(&self, channel: &SourceChannel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .source_channels
            .values()
            .any(|c| c.channel_id == channel.channel_id)
        {
            return Err(AppError::Conflict(format!(
                "Source channel {} already exists",
                channel.channel_id
            )));
        }
        tables.source_channels.insert(channel.id, channel.clone());
        Ok(())
    }

    async fn source_channel(&self, id: Uuid) -> Result<Option<SourceChannel>, AppError> {
        Ok(self.tables.read().await.source_channels.get(&id).cloned())
    }

    async fn list_source_channels(&self) -> Result<Vec<SourceChannel>, AppError> {
        let mut channels: Vec<_> = self.tables.read().await.source_channels.values().cloned().collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(channels)
    }

    async fn set_video_count(&self, id: Uuid, video_count: i64) -> Result<(), AppError> {
        if let Some(channel) = self.tables.write().await.source_channels.get_mut(&id) {
            channel.video_count = video_count;
        }
        Ok(())
    }

    async fn delete_source_channel(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let removed = tables.source_channels.remove(&id).is_some();
        if removed {
            tables.shorts.retain(|_, short| short.source_channel_id != id);
        }
        Ok(removed)
    }

    async fn insert_admin_channel(&self, channel: &AdminChannel) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .admin_channels
            .values()
            .any(|c| c.channel_id == channel.channel_id)
        {
            return Err(AppError::Conflict(format!(
                "Publication channel {} already exists",
                channel.channel_id
            )));
        }
        tables.admin_channels.insert(channel.id, channel.clone());
        Ok(())
    }

    async fn admin_channel(&self, id: Uuid) -> Result<Option<AdminChannel>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.admin_channels.get(&id).map(|c| tables.with_stats(c)))
    }

    async fn list_admin_channels(&self) -> Result<Vec<AdminChannel>, AppError> {
        let tables = self.tables.read().await;
        let mut channels: Vec<_> = tables
            .admin_channels
            .values()
            .map(|c| tables.with_stats(c))
            .collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(channels)
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "Username {} is already taken",
                user.username
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<_> = self.tables.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("User {} not found", user.id))),
        }
    }

    async fn assistant_of(&self, videaste_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.role == Role::Assistant && u.assistant_of == Some(videaste_id))
            .cloned())
    }

    async fn short(&self, id: Uuid) -> Result<Option<Short>, AppError> {
        Ok(self.tables.read().await.shorts.get(&id).cloned())
    }

    async fn list_shorts(&self, filter: &ShortFilter) -> Result<Vec<Short>, AppError> {
        let mut shorts: Vec<_> = self
            .tables
            .read()
            .await
            .shorts
            .values()
            .filter(|short| filter.matches(short))
            .cloned()
            .collect();
        shorts.sort_by_key(|short| short.rolled_at);
        Ok(shorts)
    }

    async fn claimed_videos(&self, source_channel_id: Uuid) -> Result<HashSet<String>, AppError> {
        let tables = self.tables.read().await;
        Ok(crate::domain::sampler::exclusion_set(
            tables
                .shorts
                .values()
                .filter(|short| short.source_channel_id == source_channel_id),
        ))
    }

    async fn insert_rolled_short(&self, short: &Short) -> Result<InsertOutcome, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.source_channels.contains_key(&short.source_channel_id) {
            return Err(AppError::NotFound(format!(
                "Source channel {} not found",
                short.source_channel_id
            )));
        }
        if tables.video_claimed(short) {
            return Ok(InsertOutcome::VideoClaimed);
        }
        tables.shorts.insert(short.id, short.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn update_short(
        &self,
        short: &Short,
        expected: ShortStatus,
    ) -> Result<UpdateOutcome, AppError> {
        let mut tables = self.tables.write().await;
        let stored_comments = match tables.shorts.get(&short.id) {
            None => return Err(AppError::NotFound(format!("Short {} not found", short.id))),
            Some(stored) if stored.status != expected => return Ok(UpdateOutcome::StatusChanged),
            Some(stored) => stored.comments.clone(),
        };
        if short.status.is_claimed() && tables.video_claimed(short) {
            return Ok(UpdateOutcome::VideoClaimed);
        }

        // Comments are append-only; keep the ones added since the short was read.
        let mut updated = short.clone();
        for comment in stored_comments {
            if !updated.comments.iter().any(|c| c.id == comment.id) {
                updated.comments.push(comment);
            }
        }
        updated.comments.sort_by_key(|c| c.created_at);
        tables.shorts.insert(short.id, updated);
        Ok(UpdateOutcome::Applied)
    }

    async fn add_comment(&self, short_id: Uuid, comment: &Comment) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.shorts.get_mut(&short_id) {
            Some(short) => {
                short.comments.push(comment.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
