use crate::chain::{ChainServices, ChainStep, PlaybackChainAction};
use crate::context::PlaybackRequestContext;
use async_trait::async_trait;
use core_runtime::events::{CoreEvent, ProfileEvent};

/// Remembers the outgoing track's position before a new track starts.
///
/// Writes only when the track was playing or paused and the preferences
/// allow it (all tracks, or the track already has a profile).
pub struct SavePlaybackProfileAction {
    services: ChainServices,
}

impl SavePlaybackProfileAction {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }
}

#[async_trait]
impl PlaybackChainAction for SavePlaybackProfileAction {
    fn name(&self) -> &'static str {
        "SavePlaybackProfile"
    }

    async fn execute(&self, context: &PlaybackRequestContext) -> ChainStep {
        let Some(track) = context.playing_track() else {
            return ChainStep::Proceed;
        };

        let preferences = self.services.preferences.read().clone();
        let saved = self.services.profiles.save_if_allowed(
            track,
            context.current_seek_position(),
            &preferences,
        );
        if let Some(profile) = saved {
            self.services.emit(CoreEvent::Profile(ProfileEvent::Saved {
                track_id: profile.track_id.clone(),
                position_ms: profile.position_ms(),
            }));
        }

        ChainStep::Proceed
    }
}
