//! # Playback Collaborator Traits
//!
//! Capabilities the transition chains drive but do not implement.
//!
//! ## Architecture
//!
//! The chains are pure orchestration. Everything with a side effect outside
//! the core goes through one of these seams:
//!
//! - **Player**: the audio engine. Synchronous, every call returns promptly.
//! - **PlayQueue**: ordering of tracks. All lookups are peeks; only
//!   `set_current` and `stop` change which item is current.
//! - **TrackReader**: opens files for playback. Async, may block on I/O.
//! - **ScrobbleClient**: submits listens to a remote service. Async,
//!   always invoked from a spawned task.
//!
//! ## Threading Model
//!
//! Implementations are shared between chains and spawned tasks through
//! `Arc<dyn Trait>`, so every trait is `Send + Sync`.

use crate::error::Result;
use crate::track::Track;
use async_trait::async_trait;
use core_runtime::events::PlaybackState;
use std::time::Duration;

/// The audio engine that actually renders a track.
#[cfg_attr(test, mockall::automock)]
pub trait Player: Send + Sync {
    /// Current state of the engine.
    fn state(&self) -> PlaybackState;

    /// Position within the loaded track.
    fn seek_position(&self) -> Duration;

    /// Load `track` and begin playing it from `start`.
    fn play(&self, track: &Track, start: Duration) -> Result<()>;

    /// Stop playback and unload the track. Stopping a stopped player is a no-op.
    fn stop(&self);

    fn pause(&self);

    fn resume(&self);
}

/// Ordered list of tracks with a notion of a current item.
#[cfg_attr(test, mockall::automock)]
pub trait PlayQueue: Send + Sync {
    /// The item the queue considers current.
    fn current_track(&self) -> Option<Track>;

    /// Track that should follow the current one when it finishes naturally.
    fn subsequent(&self) -> Option<Track>;

    /// Track to play when the user skips forward.
    fn next(&self) -> Option<Track>;

    /// Track to play when the user skips back.
    fn previous(&self) -> Option<Track>;

    /// Track to play when playback begins from a stopped player.
    fn first(&self) -> Option<Track>;

    /// Mark `track` as the current item.
    fn set_current(&self, track: &Track);

    /// Clear the current item.
    fn stop(&self);
}

/// Opens audio files and keeps their decoding context alive while playing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackReader: Send + Sync {
    /// Open and validate `track` so the player can start it.
    ///
    /// # Errors
    ///
    /// Fails with a displayable error that names the file when the track
    /// cannot be played.
    async fn prepare_for_playback(&self, track: &Track) -> Result<()>;

    /// Best-effort warm-up of the track expected to play next.
    async fn prefetch(&self, track: &Track) -> Result<()>;

    /// Release the live context for `track`. Safe to call repeatedly.
    fn close_playback_context(&self, track: &Track);
}

/// Remote listening-history service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScrobbleClient: Send + Sync {
    /// Submit `track` after it has been listened to for `played_for`.
    async fn scrobble_if_eligible(&self, track: &Track, played_for: Duration) -> Result<()>;
}
