use crate::chain::{ChainServices, ChainStep, PlaybackChainAction};
use crate::context::PlaybackRequestContext;
use async_trait::async_trait;
use core_runtime::events::{CoreEvent, ProfileEvent};

/// Records where playback stopped.
///
/// Always updates the store's last-position marker, and saves the track's
/// profile under the same rules as [`super::SavePlaybackProfileAction`].
pub struct MarkLastPlaybackPositionAction {
    services: ChainServices,
}

impl MarkLastPlaybackPositionAction {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            services: services.clone(),
        }
    }
}

#[async_trait]
impl PlaybackChainAction for MarkLastPlaybackPositionAction {
    fn name(&self) -> &'static str {
        "MarkLastPlaybackPosition"
    }

    async fn execute(&self, context: &PlaybackRequestContext) -> ChainStep {
        let Some(track) = context.playing_track() else {
            return ChainStep::Proceed;
        };

        let position = context.current_seek_position();
        let profiles = &self.services.profiles;
        profiles.mark_last_position(track, position);

        let preferences = self.services.preferences.read().clone();
        if let Some(profile) = profiles.save_if_allowed(track, position, &preferences) {
            self.services.emit(CoreEvent::Profile(ProfileEvent::Saved {
                track_id: profile.track_id.clone(),
                position_ms: profile.position_ms(),
            }));
        }

        ChainStep::Proceed
    }
}
