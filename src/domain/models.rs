use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::content_type::ContentType;
use super::status::ShortStatus;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Videaste,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Videaste => "VIDEASTE",
            Role::Assistant => "ASSISTANT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "VIDEASTE" => Ok(Role::Videaste),
            "ASSISTANT" => Ok(Role::Assistant),
            other => Err(AppError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Blocked,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Blocked => "BLOCKED",
        }
    }
}

impl FromStr for UserStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(UserStatus::Active),
            "BLOCKED" => Ok(UserStatus::Blocked),
            other => Err(AppError::Validation(format!("Unknown user status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    /// For assistants, the videaste they support. Lookup only.
    pub assistant_of: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            role,
            status: UserStatus::Active,
            assistant_of: None,
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn is_active_with_role(&self, role: Role) -> bool {
        self.is_active() && self.role == role
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceChannel {
    pub id: Uuid,
    /// YouTube channel id (`UC...`).
    pub channel_id: String,
    pub name: String,
    pub content_type: ContentType,
    pub profile_image: Option<String>,
    pub video_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminChannel {
    pub id: Uuid,
    pub channel_id: String,
    pub name: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub stats: PublishStats,
    pub created_at: DateTime<Utc>,
}

/// Aggregated from the shorts published to a channel, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishStats {
    pub published_count: i64,
    pub last_published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    pub video_id: String,
    pub url: String,
    pub title: Option<String>,
}

impl VideoRef {
    pub fn youtube(video_id: impl Into<String>, title: Option<String>) -> Self {
        let video_id = video_id.into();
        Self {
            url: format!("https://www.youtube.com/shorts/{}", video_id),
            video_id,
            title,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentKind {
    Note,
    Feedback,
}

impl CommentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentKind::Note => "NOTE",
            CommentKind::Feedback => "FEEDBACK",
        }
    }
}

impl FromStr for CommentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NOTE" => Ok(CommentKind::Note),
            "FEEDBACK" => Ok(CommentKind::Feedback),
            other => Err(AppError::Validation(format!("Unknown comment kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub kind: CommentKind,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Short {
    pub id: Uuid,
    pub source_channel_id: Uuid,
    pub video: VideoRef,
    pub title: Option<String>,
    pub status: ShortStatus,
    pub rolled_at: DateTime<Utc>,
    pub assigned_to: Option<Uuid>,
    pub target_channel_id: Option<Uuid>,
    pub deadline: Option<DateTime<Utc>>,
    pub artifact_url: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub validated_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub comments: Vec<Comment>,
    pub updated_at: DateTime<Utc>,
}

impl Short {
    pub fn rolled(source_channel_id: Uuid, video: VideoRef, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_channel_id,
            title: video.title.clone(),
            video,
            status: ShortStatus::Rolled,
            rolled_at: now,
            assigned_to: None,
            target_channel_id: None,
            deadline: None,
            artifact_url: None,
            completed_at: None,
            validated_at: None,
            published_at: None,
            comments: Vec::new(),
            updated_at: now,
        }
    }

    /// Whether `user` works on this short, directly or as the assignee's assistant.
    pub fn is_worked_on_by(&self, user: &User) -> bool {
        let Some(assignee) = self.assigned_to else {
            return false;
        };
        match user.role {
            Role::Videaste => user.id == assignee,
            Role::Assistant => user.assistant_of == Some(assignee),
            Role::Admin => false,
        }
    }
}
