//! # Playback Request Context
//!
//! A snapshot of the player taken when a transition is requested, plus the
//! per-player session bookkeeping that decides which request is current.
//!
//! ## Overview
//!
//! - [`PlaybackRequestContext`]: what was playing, in which state and where,
//!   and which track was requested. Shared by every action of one chain run.
//! - [`PlaybackSessions`]: tracks the in-flight request of a player. A newer
//!   request supersedes an older one, and a request older than the newest
//!   one already begun is refused.
//!
//! ## Usage
//!
//! ```rust
//! use core_playback::context::{PlaybackParams, PlaybackRequestContext, PlaybackSessions};
//! use core_playback::PlaybackState;
//! use std::time::Duration;
//!
//! let sessions = PlaybackSessions::new();
//! let first = PlaybackRequestContext::new(None, PlaybackState::Stopped, Duration::ZERO, None, PlaybackParams::default());
//! let second = PlaybackRequestContext::new(None, PlaybackState::Stopped, Duration::ZERO, None, PlaybackParams::default());
//!
//! assert!(sessions.begin(&first));
//! assert!(sessions.begin(&second));
//! assert!(!sessions.is_current(&first));
//! assert!(!sessions.begin(&first)); // outranked
//! ```

use crate::error::{PlaybackError, Result};
use crate::track::Track;
use crate::traits::{PlayQueue, Player};
use chrono::{DateTime, Utc};
use core_runtime::events::PlaybackState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, trace};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Unique, monotonically increasing identifier of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Caller options attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackParams {
    /// When `false`, the request is ignored while a track is loaded.
    pub interrupt_playback: bool,
    /// Explicit start position; wins over any remembered profile.
    pub start_position: Option<Duration>,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            interrupt_playback: true,
            start_position: None,
        }
    }
}

impl PlaybackParams {
    pub fn with_interrupt_playback(mut self, interrupt: bool) -> Self {
        self.interrupt_playback = interrupt;
        self
    }

    pub fn with_start_position(mut self, position: Duration) -> Self {
        self.start_position = Some(position);
        self
    }
}

/// Snapshot of playback state at the moment a transition was requested.
///
/// The current track, state and seek position never change after
/// construction. The requested track can be set once, before the owning
/// chain starts executing.
#[derive(Debug)]
pub struct PlaybackRequestContext {
    id: RequestId,
    created_at: DateTime<Utc>,
    current_track: Option<Track>,
    current_state: PlaybackState,
    current_seek_position: Duration,
    requested_track: OnceLock<Track>,
    params: PlaybackParams,
    // Resolved by ApplyPlaybackProfile, read by StartPlayback
    start_position: Mutex<Option<Duration>>,
}

impl PlaybackRequestContext {
    pub fn new(
        current_track: Option<Track>,
        current_state: PlaybackState,
        current_seek_position: Duration,
        requested_track: Option<Track>,
        params: PlaybackParams,
    ) -> Self {
        let requested = OnceLock::new();
        if let Some(track) = requested_track {
            let _ = requested.set(track);
        }

        Self {
            id: RequestId::next(),
            created_at: Utc::now(),
            current_track,
            current_state,
            current_seek_position,
            requested_track: requested,
            params,
            start_position: Mutex::new(None),
        }
    }

    /// Capture the live player and queue state.
    ///
    /// The queue's current item only counts as the current track while the
    /// player has a track loaded.
    pub fn capture(
        player: &dyn Player,
        queue: &dyn PlayQueue,
        requested_track: Option<Track>,
        params: PlaybackParams,
    ) -> Self {
        let state = player.state();
        let (current_track, seek) = if state.is_playing_or_paused() {
            (queue.current_track(), player.seek_position())
        } else {
            (None, Duration::ZERO)
        };

        let context = Self::new(current_track, state, seek, requested_track, params);
        trace!(request = %context.id, state = %state, "Captured playback state");
        context
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn current_state(&self) -> PlaybackState {
        self.current_state
    }

    pub fn current_seek_position(&self) -> Duration {
        self.current_seek_position
    }

    pub fn requested_track(&self) -> Option<&Track> {
        self.requested_track.get()
    }

    pub fn params(&self) -> &PlaybackParams {
        &self.params
    }

    /// Set the track to transition to.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::RequestedTrackAlreadySet`] on a second attempt.
    pub fn set_requested_track(&self, track: Track) -> Result<()> {
        self.requested_track
            .set(track)
            .map_err(|_| PlaybackError::RequestedTrackAlreadySet)
    }

    /// The track that was loaded and the state it was in, if any.
    pub fn playing_track(&self) -> Option<&Track> {
        if self.current_state.is_playing_or_paused() {
            self.current_track.as_ref()
        } else {
            None
        }
    }

    /// Position the requested track should start from (zero until resolved).
    pub fn start_position(&self) -> Duration {
        self.start_position.lock().unwrap_or(Duration::ZERO)
    }

    pub(crate) fn set_start_position(&self, position: Duration) {
        *self.start_position.lock() = Some(position);
    }
}

#[derive(Debug, Default)]
struct SessionState {
    in_flight: Option<RequestId>,
    newest: Option<RequestId>,
    /// Request that started the track currently in the player.
    started: Option<RequestId>,
}

/// Per-player bookkeeping of in-flight transitions.
///
/// Also owns the step gate: every chain acquires it around each action so
/// at most one chain touches the player at a time.
#[derive(Debug, Default)]
pub struct PlaybackSessions {
    state: Mutex<SessionState>,
    step_gate: tokio::sync::Mutex<()>,
}

impl PlaybackSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `context` as the in-flight request.
    ///
    /// Returns `false` when a newer request has already begun. Beginning the
    /// same request twice is allowed (one chain delegating to another).
    pub fn begin(&self, context: &PlaybackRequestContext) -> bool {
        let mut state = self.state.lock();
        if state.newest.is_some_and(|newest| context.id < newest) {
            debug!(request = %context.id, "Request outranked by a newer one");
            return false;
        }

        if let Some(previous) = state.in_flight.filter(|id| *id != context.id) {
            debug!(request = %context.id, superseded = %previous, "Superseding in-flight request");
        }
        state.in_flight = Some(context.id);
        state.newest = Some(context.id);
        true
    }

    /// Whether `context` is still the in-flight request.
    pub fn is_current(&self, context: &PlaybackRequestContext) -> bool {
        self.state.lock().in_flight == Some(context.id)
    }

    /// Clear the in-flight marker if it still belongs to `context`.
    pub fn complete(&self, context: &PlaybackRequestContext) {
        let mut state = self.state.lock();
        if state.in_flight == Some(context.id) {
            state.in_flight = None;
        }
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.state.lock().in_flight
    }

    /// The request whose chain started the loaded track.
    ///
    /// Hosts pass it back with completion signals so a late signal from an
    /// earlier play of the same track can be told apart.
    pub fn playing_session(&self) -> Option<RequestId> {
        self.state.lock().started
    }

    pub(crate) fn mark_started(&self, context: &PlaybackRequestContext) {
        self.state.lock().started = Some(context.id);
    }

    pub(crate) fn clear_started(&self) {
        self.state.lock().started = None;
    }

    pub(crate) async fn step_gate(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.step_gate.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockPlayQueue, MockPlayer};

    fn track(id: &str) -> Track {
        Track::new(id, format!("/music/{id}.mp3"), Duration::from_secs(180))
    }

    fn blank() -> PlaybackRequestContext {
        PlaybackRequestContext::new(
            None,
            PlaybackState::Stopped,
            Duration::ZERO,
            None,
            PlaybackParams::default(),
        )
    }

    #[test]
    fn test_request_ids_increase() {
        let a = blank();
        let b = blank();
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_requested_track_set_once() {
        let ctx = blank();
        assert!(ctx.requested_track().is_none());
        ctx.set_requested_track(track("a")).unwrap();
        assert_eq!(ctx.requested_track().map(|t| t.id.as_str()), Some("a"));

        let err = ctx.set_requested_track(track("b")).unwrap_err();
        assert!(matches!(err, PlaybackError::RequestedTrackAlreadySet));
        assert_eq!(ctx.requested_track().map(|t| t.id.as_str()), Some("a"));
    }

    #[test]
    fn test_requested_track_from_constructor_cannot_be_replaced() {
        let ctx = PlaybackRequestContext::new(
            None,
            PlaybackState::Stopped,
            Duration::ZERO,
            Some(track("a")),
            PlaybackParams::default(),
        );
        assert!(ctx.set_requested_track(track("b")).is_err());
    }

    #[test]
    fn test_start_position_defaults_to_zero() {
        let ctx = blank();
        assert_eq!(ctx.start_position(), Duration::ZERO);
        ctx.set_start_position(Duration::from_secs(45));
        assert_eq!(ctx.start_position(), Duration::from_secs(45));
    }

    #[test]
    fn test_capture_playing() {
        let mut player = MockPlayer::new();
        player.expect_state().return_const(PlaybackState::Playing);
        player
            .expect_seek_position()
            .return_const(Duration::from_secs(12));
        let mut queue = MockPlayQueue::new();
        queue.expect_current_track().returning(|| Some(track("now")));

        let ctx = PlaybackRequestContext::capture(&player, &queue, None, PlaybackParams::default());
        assert_eq!(ctx.current_state(), PlaybackState::Playing);
        assert_eq!(ctx.current_track().map(|t| t.id.as_str()), Some("now"));
        assert_eq!(ctx.current_seek_position(), Duration::from_secs(12));
    }

    #[test]
    fn test_capture_stopped_ignores_queue() {
        let mut player = MockPlayer::new();
        player.expect_state().return_const(PlaybackState::Stopped);
        player.expect_seek_position().never();
        let mut queue = MockPlayQueue::new();
        queue.expect_current_track().never();

        let ctx = PlaybackRequestContext::capture(&player, &queue, None, PlaybackParams::default());
        assert!(ctx.current_track().is_none());
        assert!(ctx.playing_track().is_none());
        assert_eq!(ctx.current_seek_position(), Duration::ZERO);
    }

    #[test]
    fn test_sessions_supersede_and_outrank() {
        let sessions = PlaybackSessions::new();
        let old = blank();
        let new = blank();

        assert!(sessions.begin(&old));
        assert!(sessions.is_current(&old));

        assert!(sessions.begin(&new));
        assert!(!sessions.is_current(&old));
        assert!(sessions.is_current(&new));

        assert!(!sessions.begin(&old));
        assert_eq!(sessions.in_flight(), Some(new.id()));
    }

    #[test]
    fn test_sessions_complete_only_clears_own_marker() {
        let sessions = PlaybackSessions::new();
        let old = blank();
        let new = blank();
        sessions.begin(&old);
        sessions.begin(&new);

        sessions.complete(&old);
        assert_eq!(sessions.in_flight(), Some(new.id()));

        sessions.complete(&new);
        assert_eq!(sessions.in_flight(), None);
    }

    #[test]
    fn test_playing_session_follows_started_request() {
        let sessions = PlaybackSessions::new();
        let first = blank();
        let replay = blank();
        assert_eq!(sessions.playing_session(), None);

        sessions.mark_started(&first);
        assert_eq!(sessions.playing_session(), Some(first.id()));

        sessions.mark_started(&replay);
        assert_eq!(sessions.playing_session(), Some(replay.id()));

        sessions.clear_started();
        assert_eq!(sessions.playing_session(), None);
    }

    #[test]
    fn test_sessions_allow_rebegin_of_same_request() {
        let sessions = PlaybackSessions::new();
        let ctx = blank();
        assert!(sessions.begin(&ctx));
        assert!(sessions.begin(&ctx));
        assert!(sessions.is_current(&ctx));
    }
}
