use crate::chain::{ChainServices, ChainStep, PlaybackChainAction};
use crate::context::PlaybackRequestContext;
use crate::track::Track;
use crate::traits::ScrobbleClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Listening for this long always qualifies, however long the track is.
pub const SCROBBLE_MAX_REQUIRED_PLAY: Duration = Duration::from_secs(4 * 60);

/// A track qualifies once it was played for half its length or 4 minutes,
/// whichever comes first.
pub fn is_scrobble_eligible(track: &Track, played_for: Duration) -> bool {
    let required = (track.duration / 2).min(SCROBBLE_MAX_REQUIRED_PLAY);
    track.can_be_scrobbled() && played_for >= required
}

/// Submits the outgoing track to the scrobble service in the background.
pub struct LastFmScrobbleAction {
    scrobbler: Option<Arc<dyn ScrobbleClient>>,
    enabled: bool,
}

impl LastFmScrobbleAction {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            scrobbler: services.scrobbler.clone(),
            enabled: services.features.enable_scrobbling,
        }
    }
}

#[async_trait]
impl PlaybackChainAction for LastFmScrobbleAction {
    fn name(&self) -> &'static str {
        "LastFMScrobble"
    }

    async fn execute(&self, context: &PlaybackRequestContext) -> ChainStep {
        let Some(client) = self.scrobbler.as_ref().filter(|_| self.enabled) else {
            return ChainStep::Proceed;
        };
        let Some(track) = context.playing_track() else {
            return ChainStep::Proceed;
        };

        let played_for = context.current_seek_position();
        if !is_scrobble_eligible(track, played_for) {
            debug!(track_id = %track.id, "Track not eligible for scrobbling");
            return ChainStep::Proceed;
        }

        let client = client.clone();
        let track = track.clone();
        tokio::spawn(async move {
            if let Err(e) = client.scrobble_if_eligible(&track, played_for).await {
                warn!(track_id = %track.id, error = %e, "Scrobble failed");
            }
        });

        ChainStep::Proceed
    }
}
