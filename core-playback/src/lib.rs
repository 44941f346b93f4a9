//! # Playback Transition Core
//!
//! Orchestrates what happens when a track starts, stops or finishes.
//!
//! ## Overview
//!
//! Every transition is a [`chain::PlaybackChain`]: an ordered list of actions
//! run against a [`context::PlaybackRequestContext`] that captured the player
//! at the moment of the request.
//!
//! - [`chain::StartPlaybackChain`]: save profile, scrobble, halt, prepare the
//!   file, apply the remembered position, start, prefetch the next track
//! - [`chain::StopPlaybackChain`]: mark the stop position, halt, end the sequence
//! - [`chain::TrackPlaybackCompletedChain`]: continue with the queue's
//!   subsequent track or stop
//!
//! A newer request supersedes one still in flight; the older chain's
//! remaining steps become no-ops. Chains publish their notifications on the
//! [`core_runtime::events::EventBus`].
//!
//! Hosts usually drive everything through [`delegate::PlaybackDelegate`].
//!
//! ## Features
//!
//! - `symphonia-reader` (default): [`reader::FileTrackReader`]
//! - `predictive-preparation` (default): prefetch step in the start chain

pub mod actions;
pub mod chain;
pub mod config;
pub mod context;
pub mod delegate;
pub mod error;
pub mod profiles;
pub mod queue;
#[cfg(feature = "symphonia-reader")]
pub mod reader;
pub mod track;
pub mod traits;

pub use chain::{
    ChainOutcome, ChainStep, PlaybackChain, PlaybackChainAction, StartPlaybackChain,
    StopPlaybackChain, TrackPlaybackCompletedChain,
};
pub use config::{PlaybackPreferences, RememberLastPositionOption};
pub use context::{PlaybackParams, PlaybackRequestContext, PlaybackSessions, RequestId};
pub use core_runtime::events::PlaybackState;
pub use delegate::{PlaybackDelegate, PlaybackDelegateBuilder};
pub use error::{PlaybackError, Result};
pub use profiles::{PlaybackProfile, PlaybackProfiles};
pub use queue::{InMemoryPlayQueue, RepeatMode};
#[cfg(feature = "symphonia-reader")]
pub use reader::FileTrackReader;
pub use track::Track;
pub use traits::{PlayQueue, Player, ScrobbleClient, TrackReader};
