//! Start chain: play the requested track.

use super::{ChainLifecycle, ChainOutcome, ChainServices, PlaybackChain};
#[cfg(feature = "predictive-preparation")]
use crate::actions::PredictiveTrackPreparationAction;
use crate::actions::{
    ApplyPlaybackProfileAction, AudioFilePreparationAction, HaltPlaybackAction,
    LastFmScrobbleAction, SavePlaybackProfileAction, StartPlaybackAction,
};
use crate::context::PlaybackRequestContext;
use crate::error::{PlaybackError, Result};
use core_runtime::events::{CoreEvent, PlaybackEvent};
use std::sync::Arc;
use tracing::instrument;

fn track_id(track: Option<&crate::track::Track>) -> Option<String> {
    track.map(|t| t.id.clone())
}

struct StartLifecycle {
    services: ChainServices,
}

impl ChainLifecycle for StartLifecycle {
    fn on_begin(&self, context: &PlaybackRequestContext) {
        self.services
            .emit(CoreEvent::Playback(PlaybackEvent::PreTrackChange {
                old_track_id: track_id(context.playing_track()),
                old_state: context.current_state(),
                new_track_id: track_id(context.requested_track()),
            }));
    }

    fn on_terminate(&self, context: &PlaybackRequestContext, error: &PlaybackError) {
        self.services.player.stop();
        self.services.sessions.clear_started();
        self.services.queue.stop();
        if let Some(requested) = context.requested_track() {
            self.services.reader.close_playback_context(requested);
        }

        self.services
            .emit(CoreEvent::Playback(PlaybackEvent::TrackNotPlayed {
                old_track_id: track_id(context.playing_track()),
                requested_track_id: track_id(context.requested_track()),
                file: error.file().map(|p| p.display().to_string()),
                message: error.user_message(),
            }));
    }

    fn on_complete(&self, context: &PlaybackRequestContext) {
        let end_state = self.services.player.state();
        let end_track_id = if end_state.is_playing_or_paused() {
            track_id(context.requested_track())
        } else {
            None
        };

        self.services
            .emit(CoreEvent::Playback(PlaybackEvent::TrackTransition {
                begin_track_id: track_id(context.playing_track()),
                begin_state: context.current_state(),
                end_track_id,
                end_state,
            }));
    }
}

/// Moves the player to the context's requested track.
///
/// SavePlaybackProfile → LastFMScrobble → HaltPlayback → AudioFilePreparation
/// → ApplyPlaybackProfile → StartPlayback → PredictiveTrackPreparation
pub struct StartPlaybackChain {
    chain: PlaybackChain,
}

impl StartPlaybackChain {
    pub fn new(services: &ChainServices) -> Self {
        let lifecycle = Arc::new(StartLifecycle {
            services: services.clone(),
        });

        let chain = PlaybackChain::new("StartPlaybackChain", services.sessions.clone(), lifecycle)
            .with_action(SavePlaybackProfileAction::new(services))
            .with_action(LastFmScrobbleAction::new(services))
            .with_action(HaltPlaybackAction::new(services))
            .with_action(AudioFilePreparationAction::new(services))
            .with_action(ApplyPlaybackProfileAction::new(services))
            .with_action(StartPlaybackAction::new(services));

        #[cfg(feature = "predictive-preparation")]
        let chain = chain.with_action(PredictiveTrackPreparationAction::new(services));

        Self { chain }
    }

    pub fn action_names(&self) -> Vec<&'static str> {
        self.chain.action_names()
    }

    /// Run the chain.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoRequestedTrack`] without touching the player
    /// or publishing anything when the context has no requested track.
    #[instrument(skip_all, fields(request = %context.id()))]
    pub async fn execute(&self, context: &PlaybackRequestContext) -> Result<ChainOutcome> {
        if context.requested_track().is_none() {
            return Err(PlaybackError::NoRequestedTrack);
        }
        Ok(self.chain.execute(context).await)
    }
}
