//! # Playback Profiles
//!
//! Remembered positions per track, used to resume a track where it was left.
//!
//! ## Overview
//!
//! [`PlaybackProfiles`] is an in-memory store keyed by track id. It also keeps
//! a single "last playback position" marker written when playback stops, and
//! can be dumped to / restored from a serializable [`ProfilesSnapshot`] so a
//! host can persist it between sessions.
//!
//! Positions at or after the end of a track are stored as zero, so a track
//! that was played to the end starts from the beginning next time.

use crate::config::PlaybackPreferences;
use crate::track::Track;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Position to remember for a track stopped at `position`.
pub fn coerce_position(position: Duration, duration: Duration) -> Duration {
    if position >= duration {
        Duration::ZERO
    } else {
        position
    }
}

/// A remembered position for one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackProfile {
    pub track_id: String,
    pub last_position: Duration,
}

impl PlaybackProfile {
    /// Profile for `track` stopped at `position` (coerced).
    pub fn for_track(track: &Track, position: Duration) -> Self {
        Self {
            track_id: track.id.clone(),
            last_position: coerce_position(position, track.duration),
        }
    }

    /// Remembered position in whole milliseconds.
    pub fn position_ms(&self) -> u64 {
        self.last_position.as_millis() as u64
    }
}

/// Serializable dump of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilesSnapshot {
    pub profiles: Vec<PlaybackProfile>,
    pub last_position: Option<PlaybackProfile>,
}

#[derive(Debug, Default)]
struct ProfilesInner {
    by_track: HashMap<String, PlaybackProfile>,
    last_position: Option<PlaybackProfile>,
}

/// Thread-safe store of playback profiles.
#[derive(Debug, Default)]
pub struct PlaybackProfiles {
    inner: RwLock<ProfilesInner>,
}

impl PlaybackProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, track: &Track) -> Option<PlaybackProfile> {
        self.inner.read().by_track.get(&track.id).cloned()
    }

    pub fn has_for(&self, track: &Track) -> bool {
        self.inner.read().by_track.contains_key(&track.id)
    }

    pub fn set(&self, profile: PlaybackProfile) {
        self.inner
            .write()
            .by_track
            .insert(profile.track_id.clone(), profile);
    }

    pub fn remove(&self, track: &Track) -> Option<PlaybackProfile> {
        self.inner.write().by_track.remove(&track.id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_track.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Save `track` at `position` if the preferences allow it.
    ///
    /// Returns the stored profile, or `None` when gating skipped the write.
    pub fn save_if_allowed(
        &self,
        track: &Track,
        position: Duration,
        preferences: &PlaybackPreferences,
    ) -> Option<PlaybackProfile> {
        let mut inner = self.inner.write();
        let exists = inner.by_track.contains_key(&track.id);
        if !preferences.should_save_profile(exists) {
            return None;
        }

        let profile = PlaybackProfile::for_track(track, position);
        debug!(
            track_id = %profile.track_id,
            position_ms = profile.position_ms(),
            "Saving playback profile"
        );
        inner.by_track.insert(track.id.clone(), profile.clone());
        Some(profile)
    }

    /// Where playback last stopped.
    pub fn last_position(&self) -> Option<PlaybackProfile> {
        self.inner.read().last_position.clone()
    }

    pub fn mark_last_position(&self, track: &Track, position: Duration) {
        self.inner.write().last_position = Some(PlaybackProfile::for_track(track, position));
    }

    pub fn snapshot(&self) -> ProfilesSnapshot {
        let inner = self.inner.read();
        let mut profiles: Vec<_> = inner.by_track.values().cloned().collect();
        profiles.sort_by(|a, b| a.track_id.cmp(&b.track_id));
        ProfilesSnapshot {
            profiles,
            last_position: inner.last_position.clone(),
        }
    }

    pub fn from_snapshot(snapshot: ProfilesSnapshot) -> Self {
        let by_track = snapshot
            .profiles
            .into_iter()
            .map(|p| (p.track_id.clone(), p))
            .collect();
        Self {
            inner: RwLock::new(ProfilesInner {
                by_track,
                last_position: snapshot.last_position,
            }),
        }
    }
}
