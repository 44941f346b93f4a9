use crate::chain::{ChainServices, ChainStep, PlaybackChainAction};
use crate::context::PlaybackRequestContext;
use crate::error::PlaybackError;
use crate::traits::TrackReader;
use async_trait::async_trait;
use core_runtime::logging::strip_path;
use std::sync::Arc;
use tracing::{debug, info};

/// Opens the requested track's file so the player can start it.
pub struct AudioFilePreparationAction {
    reader: Arc<dyn TrackReader>,
}

impl AudioFilePreparationAction {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            reader: services.reader.clone(),
        }
    }
}

#[async_trait]
impl PlaybackChainAction for AudioFilePreparationAction {
    fn name(&self) -> &'static str {
        "AudioFilePreparation"
    }

    async fn execute(&self, context: &PlaybackRequestContext) -> ChainStep {
        let Some(track) = context.requested_track() else {
            return ChainStep::Terminate(PlaybackError::NoRequestedTrack);
        };

        let path = track.path.to_string_lossy();
        debug!(track_id = %track.id, file = %strip_path(&path), "Preparing file");

        match self.reader.prepare_for_playback(track).await {
            Ok(()) => ChainStep::Proceed,
            Err(e) => {
                info!(track_id = %track.id, file = %strip_path(&path), error = %e, "Track cannot be played");
                ChainStep::Terminate(e)
            }
        }
    }
}
