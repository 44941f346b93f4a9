use crate::chain::{ChainServices, ChainStep, PlaybackChainAction};
use crate::context::PlaybackRequestContext;
use crate::traits::PlayQueue;
use async_trait::async_trait;
use std::sync::Arc;

/// Ends the playback sequence by clearing the queue's current item.
pub struct EndPlaybackSequenceAction {
    queue: Arc<dyn PlayQueue>,
}

impl EndPlaybackSequenceAction {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            queue: services.queue.clone(),
        }
    }
}

#[async_trait]
impl PlaybackChainAction for EndPlaybackSequenceAction {
    fn name(&self) -> &'static str {
        "EndPlaybackSequence"
    }

    async fn execute(&self, _context: &PlaybackRequestContext) -> ChainStep {
        self.queue.stop();
        ChainStep::Proceed
    }
}
