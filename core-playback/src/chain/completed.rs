//! Completed chain: a track finished playing on its own.

use super::{ChainOutcome, ChainServices, StartPlaybackChain, StopPlaybackChain};
use crate::context::PlaybackRequestContext;
use crate::error::Result;
use crate::traits::PlayQueue;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Continues with the queue's subsequent track, or stops when there is none.
pub struct TrackPlaybackCompletedChain {
    queue: Arc<dyn PlayQueue>,
    start: Arc<StartPlaybackChain>,
    stop: Arc<StopPlaybackChain>,
}

impl TrackPlaybackCompletedChain {
    pub fn new(
        services: &ChainServices,
        start: Arc<StartPlaybackChain>,
        stop: Arc<StopPlaybackChain>,
    ) -> Self {
        Self {
            queue: services.queue.clone(),
            start,
            stop,
        }
    }

    /// Route the completion.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaybackError::RequestedTrackAlreadySet`] if the
    /// context already carries a requested track.
    #[instrument(skip_all, fields(request = %context.id()))]
    pub async fn execute(&self, context: &PlaybackRequestContext) -> Result<ChainOutcome> {
        match self.queue.subsequent() {
            Some(track) => {
                debug!(track_id = %track.id, "Continuing with subsequent track");
                context.set_requested_track(track)?;
                self.start.execute(context).await
            }
            None => {
                debug!("End of queue, stopping");
                Ok(self.stop.execute(context).await)
            }
        }
    }
}
