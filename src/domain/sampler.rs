//! Roll sampler: uniform pick over the catalog minus the claimed videos.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use super::models::{Short, SourceChannel, VideoRef};
use crate::errors::AppError;

/// Video ids of `shorts` that keep their video out of the roll pool.
pub fn exclusion_set<'a>(shorts: impl IntoIterator<Item = &'a Short>) -> HashSet<String> {
    shorts
        .into_iter()
        .filter(|short| short.status.is_claimed())
        .map(|short| short.video.video_id.clone())
        .collect()
}

pub fn roll<R: Rng + ?Sized>(
    source: &SourceChannel,
    catalog: &[VideoRef],
    excluded: &HashSet<String>,
    rng: &mut R,
) -> Result<VideoRef, AppError> {
    let mut seen = HashSet::new();
    let eligible: Vec<&VideoRef> = catalog
        .iter()
        .filter(|video| !excluded.contains(&video.video_id))
        .filter(|video| seen.insert(video.video_id.as_str()))
        .collect();

    tracing::debug!(
        source_channel_id = %source.id,
        catalog = catalog.len(),
        excluded = excluded.len(),
        eligible = eligible.len(),
        "Sampling roll candidate"
    );

    eligible
        .choose(rng)
        .map(|video| (*video).clone())
        .ok_or(AppError::NoEligibleVideos {
            source_channel_id: source.id,
        })
}
