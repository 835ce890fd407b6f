//! Persistence seam. The service only talks to [`Store`]; the in-memory
//! backend serves tests and local runs, PostgreSQL serves deployments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::{AdminChannel, Comment, Short, ShortStatus, SourceChannel, User};
use crate::errors::AppError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortFilter {
    pub status: Option<ShortStatus>,
    pub assigned_to: Option<Uuid>,
    pub source_channel_id: Option<Uuid>,
    pub target_channel_id: Option<Uuid>,
}

impl ShortFilter {
    pub fn matches(&self, short: &Short) -> bool {
        self.status.map_or(true, |s| short.status == s)
            && self.assigned_to.map_or(true, |u| short.assigned_to == Some(u))
            && self
                .source_channel_id
                .map_or(true, |c| short.source_channel_id == c)
            && self
                .target_channel_id
                .map_or(true, |c| short.target_channel_id == Some(c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another short of the same source claimed the video in the meantime.
    VideoClaimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The stored status no longer matched the expected one.
    StatusChanged,
    VideoClaimed,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_source_channel(&self, channel: &SourceChannel) -> Result<(), AppError>;
    async fn source_channel(&self, id: Uuid) -> Result<Option<SourceChannel>, AppError>;
    async fn list_source_channels(&self) -> Result<Vec<SourceChannel>, AppError>;
    async fn set_video_count(&self, id: Uuid, video_count: i64) -> Result<(), AppError>;
    /// Removes the channel and every short rolled from it.
    async fn delete_source_channel(&self, id: Uuid) -> Result<bool, AppError>;

    async fn insert_admin_channel(&self, channel: &AdminChannel) -> Result<(), AppError>;
    async fn admin_channel(&self, id: Uuid) -> Result<Option<AdminChannel>, AppError>;
    async fn list_admin_channels(&self) -> Result<Vec<AdminChannel>, AppError>;

    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn update_user(&self, user: &User) -> Result<(), AppError>;
    async fn assistant_of(&self, videaste_id: Uuid) -> Result<Option<User>, AppError>;

    async fn short(&self, id: Uuid) -> Result<Option<Short>, AppError>;
    /// Matching shorts, oldest roll first.
    async fn list_shorts(&self, filter: &ShortFilter) -> Result<Vec<Short>, AppError>;
    async fn claimed_videos(&self, source_channel_id: Uuid) -> Result<HashSet<String>, AppError>;
    /// Inserts a ROLLED short unless its video is claimed for the source.
    async fn insert_rolled_short(&self, short: &Short) -> Result<InsertOutcome, AppError>;
    /// Compare-and-set: writes `short` only if the stored status is `expected`.
    async fn update_short(
        &self,
        short: &Short,
        expected: ShortStatus,
    ) -> Result<UpdateOutcome, AppError>;
    async fn add_comment(&self, short_id: Uuid, comment: &Comment) -> Result<bool, AppError>;
}
