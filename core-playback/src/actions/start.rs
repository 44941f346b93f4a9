use crate::chain::{ChainServices, ChainStep, PlaybackChainAction};
use crate::context::{PlaybackRequestContext, PlaybackSessions};
use crate::error::PlaybackError;
use crate::traits::{PlayQueue, Player};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Makes the requested track the queue's current item and starts the player.
///
/// On success the request is recorded as the one that started the track.
pub struct StartPlaybackAction {
    player: Arc<dyn Player>,
    queue: Arc<dyn PlayQueue>,
    sessions: Arc<PlaybackSessions>,
}

impl StartPlaybackAction {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            player: services.player.clone(),
            queue: services.queue.clone(),
            sessions: services.sessions.clone(),
        }
    }
}

#[async_trait]
impl PlaybackChainAction for StartPlaybackAction {
    fn name(&self) -> &'static str {
        "StartPlayback"
    }

    async fn execute(&self, context: &PlaybackRequestContext) -> ChainStep {
        let Some(track) = context.requested_track() else {
            return ChainStep::Terminate(PlaybackError::NoRequestedTrack);
        };

        let start = context.start_position();
        self.queue.set_current(track);
        if let Err(e) = self.player.play(track, start) {
            return ChainStep::Terminate(e);
        }
        self.sessions.mark_started(context);

        info!(track_id = %track.id, start_ms = start.as_millis() as u64, "Playback started");
        ChainStep::Proceed
    }
}
