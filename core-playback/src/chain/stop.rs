//! Stop chain: end playback.

use super::{ChainLifecycle, ChainOutcome, ChainServices, PlaybackChain};
use crate::actions::{
    EndPlaybackSequenceAction, HaltPlaybackAction, MarkLastPlaybackPositionAction,
};
use crate::context::PlaybackRequestContext;
use core_runtime::events::{CoreEvent, PlaybackEvent, PlaybackState};
use std::sync::Arc;
use tracing::instrument;

struct StopLifecycle {
    services: ChainServices,
}

impl ChainLifecycle for StopLifecycle {
    fn on_begin(&self, context: &PlaybackRequestContext) {
        let Some(current) = context.playing_track() else {
            return;
        };
        self.services
            .emit(CoreEvent::Playback(PlaybackEvent::PreTrackChange {
                old_track_id: Some(current.id.clone()),
                old_state: context.current_state(),
                new_track_id: None,
            }));
    }

    fn on_complete(&self, context: &PlaybackRequestContext) {
        self.services
            .emit(CoreEvent::Playback(PlaybackEvent::TrackTransition {
                begin_track_id: context.playing_track().map(|t| t.id.clone()),
                begin_state: context.current_state(),
                end_track_id: None,
                end_state: PlaybackState::Stopped,
            }));
    }
}

/// Stops playback and ends the queue's sequence.
///
/// MarkLastPlaybackPosition → HaltPlayback → EndPlaybackSequence
pub struct StopPlaybackChain {
    chain: PlaybackChain,
}

impl StopPlaybackChain {
    pub fn new(services: &ChainServices) -> Self {
        let lifecycle = Arc::new(StopLifecycle {
            services: services.clone(),
        });

        let chain = PlaybackChain::new("StopPlaybackChain", services.sessions.clone(), lifecycle)
            .with_action(MarkLastPlaybackPositionAction::new(services))
            .with_action(HaltPlaybackAction::new(services))
            .with_action(EndPlaybackSequenceAction::new(services));

        Self { chain }
    }

    pub fn action_names(&self) -> Vec<&'static str> {
        self.chain.action_names()
    }

    #[instrument(skip_all, fields(request = %context.id()))]
    pub async fn execute(&self, context: &PlaybackRequestContext) -> ChainOutcome {
        self.chain.execute(context).await
    }
}
