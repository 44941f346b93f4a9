//! # Playback Chains
//!
//! A chain is a fixed, ordered list of actions that moves the player from
//! one track/state to another. Chains are assembled once and executed many
//! times; every execution gets its own cursor.
//!
//! ## Stepping
//!
//! ```text
//! execute ──> begin session ──> on_begin ──> proceed ─┬─> action[i] ── Proceed ──┐
//!                 │                              ^    │                          │
//!             Outranked                          └────┼──────────────────────────┘
//!                                                     ├─> past end ──> complete
//!                                                     ├─> Terminate ─> terminate ──> complete
//!                                                     └─> stale ─────> Superseded (no hooks)
//! ```
//!
//! Each step holds the player's step gate, and the staleness check happens
//! after the gate is acquired. Once a newer request has begun, an older
//! chain never touches the player again.

mod completed;
mod start;
mod stop;

pub use completed::TrackPlaybackCompletedChain;
pub use start::StartPlaybackChain;
pub use stop::StopPlaybackChain;

use crate::config::SharedPreferences;
use crate::context::{PlaybackRequestContext, PlaybackSessions};
use crate::error::PlaybackError;
use crate::profiles::PlaybackProfiles;
use crate::traits::{PlayQueue, Player, ScrobbleClient, TrackReader};
use async_trait::async_trait;
use core_runtime::config::FeatureFlags;
use core_runtime::events::{CoreEvent, EventBus};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

/// What an action tells the chain to do next.
#[derive(Debug)]
pub enum ChainStep {
    /// Run the next action.
    Proceed,
    /// Abandon the transition with `error`.
    Terminate(PlaybackError),
}

/// How a chain execution ended.
#[derive(Debug)]
pub enum ChainOutcome {
    /// Every action ran.
    Completed,
    /// An action aborted the chain; cleanup ran.
    Terminated(PlaybackError),
    /// A newer request took over mid-chain; the remaining steps were skipped.
    Superseded,
    /// A newer request had already begun; nothing ran.
    Outranked,
}

impl ChainOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ChainOutcome::Completed)
    }

    pub fn error(&self) -> Option<&PlaybackError> {
        match self {
            ChainOutcome::Terminated(err) => Some(err),
            _ => None,
        }
    }
}

/// One unit of work in a chain.
#[async_trait]
pub trait PlaybackChainAction: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, context: &PlaybackRequestContext) -> ChainStep;
}

/// Chain-specific hooks around an execution.
pub trait ChainLifecycle: Send + Sync {
    /// The session was begun and stepping is about to start.
    fn on_begin(&self, _context: &PlaybackRequestContext) {}

    /// An action terminated the chain.
    fn on_terminate(&self, _context: &PlaybackRequestContext, _error: &PlaybackError) {}

    /// The chain finished (after `on_terminate` when it was terminated).
    fn on_complete(&self, _context: &PlaybackRequestContext) {}
}

/// Lifecycle with no hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLifecycle;

impl ChainLifecycle for NoLifecycle {}

/// Everything the chains and their actions operate on.
#[derive(Clone)]
pub struct ChainServices {
    pub player: Arc<dyn Player>,
    pub queue: Arc<dyn PlayQueue>,
    pub reader: Arc<dyn TrackReader>,
    pub scrobbler: Option<Arc<dyn ScrobbleClient>>,
    pub profiles: Arc<PlaybackProfiles>,
    pub preferences: SharedPreferences,
    pub events: EventBus,
    pub features: FeatureFlags,
    pub sessions: Arc<PlaybackSessions>,
}

impl ChainServices {
    /// Publish an event; having no subscribers is not an error.
    pub fn emit(&self, event: CoreEvent) {
        if self.events.emit(event).is_err() {
            trace!("No event subscribers");
        }
    }
}

impl fmt::Debug for ChainServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainServices")
            .field("has_scrobbler", &self.scrobbler.is_some())
            .field("features", &self.features)
            .field("events", &self.events)
            .finish()
    }
}

/// An ordered list of actions executed for one kind of transition.
pub struct PlaybackChain {
    name: &'static str,
    actions: Vec<Arc<dyn PlaybackChainAction>>,
    sessions: Arc<PlaybackSessions>,
    lifecycle: Arc<dyn ChainLifecycle>,
}

impl PlaybackChain {
    pub fn new(
        name: &'static str,
        sessions: Arc<PlaybackSessions>,
        lifecycle: Arc<dyn ChainLifecycle>,
    ) -> Self {
        Self {
            name,
            actions: Vec::new(),
            sessions,
            lifecycle,
        }
    }

    /// Append an action.
    pub fn with_action(mut self, action: impl PlaybackChainAction + 'static) -> Self {
        self.actions.push(Arc::new(action));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn action_names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    /// Run the chain for `context`.
    #[instrument(skip_all, fields(chain = self.name, request = %context.id()))]
    pub async fn execute(&self, context: &PlaybackRequestContext) -> ChainOutcome {
        if !self.sessions.begin(context) {
            return ChainOutcome::Outranked;
        }

        self.lifecycle.on_begin(context);

        let mut cursor: isize = -1;
        self.proceed(context, &mut cursor).await
    }

    async fn proceed(&self, context: &PlaybackRequestContext, cursor: &mut isize) -> ChainOutcome {
        loop {
            *cursor += 1;
            let _gate = self.sessions.step_gate().await;

            if !self.sessions.is_current(context) {
                debug!(step = *cursor, "Request superseded, skipping remaining steps");
                return ChainOutcome::Superseded;
            }

            let Some(action) = self.actions.get(*cursor as usize) else {
                self.complete(context);
                return ChainOutcome::Completed;
            };

            trace!(action = action.name(), "Executing action");
            match action.execute(context).await {
                ChainStep::Proceed => {}
                ChainStep::Terminate(error) => {
                    if !self.sessions.is_current(context) {
                        debug!(action = action.name(), %error, "Superseded request failed");
                        return ChainOutcome::Superseded;
                    }
                    warn!(action = action.name(), %error, "Chain terminated");
                    self.terminate(context, &error);
                    return ChainOutcome::Terminated(error);
                }
            }
        }
    }

    /// Run the cleanup hook for `error`, then complete.
    pub fn terminate(&self, context: &PlaybackRequestContext, error: &PlaybackError) {
        self.lifecycle.on_terminate(context, error);
        self.complete(context);
    }

    /// Clear the in-flight marker (if it is still ours) and run the completion hook.
    pub fn complete(&self, context: &PlaybackRequestContext) {
        self.sessions.complete(context);
        self.lifecycle.on_complete(context);
    }
}

impl fmt::Debug for PlaybackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackChain")
            .field("name", &self.name)
            .field("actions", &self.action_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlaybackParams;
    use crate::PlaybackState;
    use parking_lot::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recording {
        name: &'static str,
        log: Log,
        fail: bool,
    }

    #[async_trait]
    impl PlaybackChainAction for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, _context: &PlaybackRequestContext) -> ChainStep {
            self.log.lock().push(self.name.to_string());
            if self.fail {
                ChainStep::Terminate(PlaybackError::PlayerFailed("boom".to_string()))
            } else {
                ChainStep::Proceed
            }
        }
    }

    struct HookLog(Log);

    impl ChainLifecycle for HookLog {
        fn on_begin(&self, _context: &PlaybackRequestContext) {
            self.0.lock().push("begin".to_string());
        }

        fn on_terminate(&self, _context: &PlaybackRequestContext, error: &PlaybackError) {
            self.0.lock().push(format!("terminate: {error}"));
        }

        fn on_complete(&self, _context: &PlaybackRequestContext) {
            self.0.lock().push("complete".to_string());
        }
    }

    fn context() -> PlaybackRequestContext {
        PlaybackRequestContext::new(
            None,
            PlaybackState::Stopped,
            Duration::ZERO,
            None,
            PlaybackParams::default(),
        )
    }

    fn chain(log: &Log, fail_at: Option<&'static str>) -> PlaybackChain {
        let sessions = Arc::new(PlaybackSessions::new());
        let mut chain = PlaybackChain::new("test", sessions, Arc::new(HookLog(log.clone())));
        for name in ["a", "b", "c"] {
            chain = chain.with_action(Recording {
                name,
                log: log.clone(),
                fail: fail_at == Some(name),
            });
        }
        chain
    }

    #[tokio::test]
    async fn test_runs_actions_in_order() {
        let log: Log = Arc::default();
        let chain = chain(&log, None);
        let ctx = context();

        assert!(chain.execute(&ctx).await.is_completed());
        assert_eq!(*log.lock(), vec!["begin", "a", "b", "c", "complete"]);
        assert_eq!(chain.sessions.in_flight(), None);
    }

    #[tokio::test]
    async fn test_terminate_short_circuits() {
        let log: Log = Arc::default();
        let chain = chain(&log, Some("b"));
        let ctx = context();

        let outcome = chain.execute(&ctx).await;
        assert!(matches!(outcome, ChainOutcome::Terminated(PlaybackError::PlayerFailed(_))));
        assert_eq!(
            *log.lock(),
            vec!["begin", "a", "b", "terminate: Player failed: boom", "complete"]
        );
    }

    #[tokio::test]
    async fn test_cursor_is_fresh_per_execution() {
        let log: Log = Arc::default();
        let chain = chain(&log, None);

        chain.execute(&context()).await;
        log.lock().clear();
        chain.execute(&context()).await;

        assert_eq!(*log.lock(), vec!["begin", "a", "b", "c", "complete"]);
    }

    #[tokio::test]
    async fn test_outranked_context_runs_nothing() {
        let log: Log = Arc::default();
        let chain = chain(&log, None);
        let older = context();
        let newer = context();

        chain.execute(&newer).await;
        log.lock().clear();

        assert!(matches!(chain.execute(&older).await, ChainOutcome::Outranked));
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_chain_completes() {
        let sessions = Arc::new(PlaybackSessions::new());
        let chain = PlaybackChain::new("empty", sessions, Arc::new(NoLifecycle));
        assert!(chain.execute(&context()).await.is_completed());
        assert!(chain.action_names().is_empty());
    }
}
