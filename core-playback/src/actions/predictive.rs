use crate::chain::{ChainServices, ChainStep, PlaybackChainAction};
use crate::context::PlaybackRequestContext;
use crate::traits::{PlayQueue, TrackReader};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Warms up the track expected to play after the requested one.
///
/// The prefetch runs in a spawned task and never affects the chain.
pub struct PredictiveTrackPreparationAction {
    queue: Arc<dyn PlayQueue>,
    reader: Arc<dyn TrackReader>,
    enabled: bool,
}

impl PredictiveTrackPreparationAction {
    pub fn new(services: &ChainServices) -> Self {
        Self {
            queue: services.queue.clone(),
            reader: services.reader.clone(),
            enabled: services.features.enable_predictive_preparation,
        }
    }
}

#[async_trait]
impl PlaybackChainAction for PredictiveTrackPreparationAction {
    fn name(&self) -> &'static str {
        "PredictiveTrackPreparation"
    }

    async fn execute(&self, context: &PlaybackRequestContext) -> ChainStep {
        if !self.enabled {
            return ChainStep::Proceed;
        }

        let Some(upcoming) = self.queue.subsequent() else {
            return ChainStep::Proceed;
        };
        if context.requested_track() == Some(&upcoming) {
            return ChainStep::Proceed;
        }

        debug!(track_id = %upcoming.id, "Prefetching subsequent track");
        let reader = self.reader.clone();
        tokio::spawn(async move {
            if let Err(e) = reader.prefetch(&upcoming).await {
                warn!(track_id = %upcoming.id, error = %e, "Prefetch failed");
            }
        });

        ChainStep::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{services, stopped, track};
    use crate::error::PlaybackError;
    use crate::traits::{MockPlayQueue, MockPlayer, MockTrackReader};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_prefetches_subsequent_track() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut queue = MockPlayQueue::new();
        queue.expect_subsequent().returning(|| Some(track("c", 200)));
        let mut reader = MockTrackReader::new();
        reader.expect_prefetch().times(1).returning(move |t| {
            let _ = tx.send(t.id.clone());
            Ok(())
        });

        let action =
            PredictiveTrackPreparationAction::new(&services(MockPlayer::new(), queue, reader));
        action.execute(&stopped(Some(track("b", 200)))).await;

        assert_eq!(rx.recv().await.unwrap(), "c");
    }

    #[tokio::test]
    async fn test_prefetch_failure_still_proceeds() {
        let mut queue = MockPlayQueue::new();
        queue.expect_subsequent().returning(|| Some(track("c", 200)));
        let mut reader = MockTrackReader::new();
        reader
            .expect_prefetch()
            .returning(|t| Err(PlaybackError::FileNotFound { path: t.path.clone() }));

        let action =
            PredictiveTrackPreparationAction::new(&services(MockPlayer::new(), queue, reader));
        let step = action.execute(&stopped(Some(track("b", 200)))).await;
        assert!(matches!(step, ChainStep::Proceed));
    }

    #[tokio::test]
    async fn test_disabled_flag_skips_queue_lookup() {
        let mut queue = MockPlayQueue::new();
        queue.expect_subsequent().never();

        let mut services = services(MockPlayer::new(), queue, MockTrackReader::new());
        services.features.enable_predictive_preparation = false;
        let action = PredictiveTrackPreparationAction::new(&services);
        action.execute(&stopped(Some(track("b", 200)))).await;
    }

    #[tokio::test]
    async fn test_repeat_one_does_not_prefetch_requested_track() {
        let mut queue = MockPlayQueue::new();
        queue.expect_subsequent().returning(|| Some(track("b", 200)));
        let mut reader = MockTrackReader::new();
        reader.expect_prefetch().never();

        let action =
            PredictiveTrackPreparationAction::new(&services(MockPlayer::new(), queue, reader));
        action.execute(&stopped(Some(track("b", 200)))).await;
    }
}
