//! Channel video catalog providers feeding the roll sampler.

pub mod youtube;

use async_trait::async_trait;

use crate::domain::{SourceChannel, VideoRef};
use crate::errors::AppError;

pub use youtube::YoutubeCatalog;

#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Every video currently known for the channel. Provider failures are
    /// `CatalogUnavailable`, never an empty list.
    async fn list_candidate_videos(&self, source: &SourceChannel) -> Result<Vec<VideoRef>, AppError>;
}
