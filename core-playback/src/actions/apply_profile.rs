use crate::chain::{ChainServices, ChainStep, PlaybackChainAction};
use crate::config::SharedPreferences;
use crate::context::PlaybackRequestContext;
use crate::profiles::{coerce_position, PlaybackProfiles};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Resolves where the requested track starts.
///
/// An explicit start position from the request wins. Otherwise a remembered
/// profile is resumed when preferences allow it, unless it points at or past
/// the end of the track.
pub struct ApplyPlaybackProfileAction {
    profiles: Arc<PlaybackProfiles>,
    preferences: SharedPreferences,
}

impl ApplyPlaybackProfileAction {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            profiles: services.profiles.clone(),
            preferences: services.preferences.clone(),
        }
    }
}

#[async_trait]
impl PlaybackChainAction for ApplyPlaybackProfileAction {
    fn name(&self) -> &'static str {
        "ApplyPlaybackProfile"
    }

    async fn execute(&self, context: &PlaybackRequestContext) -> ChainStep {
        let Some(track) = context.requested_track() else {
            return ChainStep::Proceed;
        };

        let resume = self.preferences.read().should_resume();
        let start = match context.params().start_position {
            Some(explicit) => explicit,
            None if resume => self
                .profiles
                .get(track)
                .map(|profile| coerce_position(profile.last_position, track.duration))
                .unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        };

        debug!(track_id = %track.id, start_ms = start.as_millis() as u64, "Resolved start position");
        context.set_start_position(start);
        ChainStep::Proceed
    }
}
