use crate::chain::{ChainServices, ChainStep, PlaybackChainAction};
use crate::context::{PlaybackRequestContext, PlaybackSessions};
use crate::traits::{Player, TrackReader};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Stops the player and releases the outgoing track's decoding context.
///
/// Does nothing when the player was already stopped.
pub struct HaltPlaybackAction {
    player: Arc<dyn Player>,
    reader: Arc<dyn TrackReader>,
    sessions: Arc<PlaybackSessions>,
}

impl HaltPlaybackAction {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            player: services.player.clone(),
            reader: services.reader.clone(),
            sessions: services.sessions.clone(),
        }
    }
}

#[async_trait]
impl PlaybackChainAction for HaltPlaybackAction {
    fn name(&self) -> &'static str {
        "HaltPlayback"
    }

    async fn execute(&self, context: &PlaybackRequestContext) -> ChainStep {
        if let Some(track) = context.playing_track() {
            debug!(track_id = %track.id, "Halting playback");
            self.player.stop();
            self.sessions.clear_started();
            self.reader.close_playback_context(track);
        }
        ChainStep::Proceed
    }
}
