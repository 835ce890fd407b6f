//! Short lifecycle & assignment core.
//!
//! Everything in here is synchronous and free of I/O; the service layer
//! loads entities, calls into these functions and persists the outcome.

pub mod assignment;
pub mod content_type;
pub mod events;
pub mod lifecycle;
pub mod models;
pub mod sampler;
pub mod status;

pub use content_type::ContentType;
pub use events::{DomainEvent, EventKind};
pub use lifecycle::LifecyclePolicy;
pub use models::{
    AdminChannel, Comment, CommentKind, PublishStats, Role, Short, SourceChannel, User,
    UserStatus, VideoRef,
};
pub use status::{RejectBackTarget, ShortAction, ShortStatus};

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use super::*;

    pub fn source_channel(content_type: ContentType) -> SourceChannel {
        SourceChannel {
            id: Uuid::new_v4(),
            channel_id: "UCsource0000000000000000".to_string(),
            name: "Source".to_string(),
            content_type,
            profile_image: None,
            video_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn admin_channel(content_type: ContentType) -> AdminChannel {
        AdminChannel {
            id: Uuid::new_v4(),
            channel_id: "UCtarget0000000000000000".to_string(),
            name: "Target".to_string(),
            content_type,
            stats: PublishStats::default(),
            created_at: Utc::now(),
        }
    }

    /// A source, a target, a rolled short and the cast of users around it.
    pub struct Fixture {
        pub now: DateTime<Utc>,
        pub source: SourceChannel,
        pub target: AdminChannel,
        pub short: Short,
        pub admin: User,
        pub videaste: User,
        pub other_videaste: User,
        pub assistant: User,
    }

    impl Fixture {
        pub fn new(source_type: ContentType, target_type: ContentType) -> Self {
            let now = Utc::now();
            let source = source_channel(source_type);
            let videaste = User::new("videaste", Role::Videaste, now);
            let mut assistant = User::new("assistant", Role::Assistant, now);
            assistant.assistant_of = Some(videaste.id);
            Self {
                short: Short::rolled(source.id, VideoRef::youtube("v1", None), now),
                target: admin_channel(target_type),
                admin: User::new("admin", Role::Admin, now),
                other_videaste: User::new("other", Role::Videaste, now),
                source,
                videaste,
                assistant,
                now,
            }
        }
    }
}
