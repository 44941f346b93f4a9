//! # In-Memory Play Queue
//!
//! An ordered list of tracks with repeat modes, implementing [`PlayQueue`].
//!
//! | Lookup | Off | One | All |
//! |--------|-----|-----|-----|
//! | `subsequent` (natural end) | next or none | same track | next, wraps |
//! | `next` (user skip) | next or none | next or none | next, wraps |
//! | `previous` (user skip) | previous or none | previous or none | previous, wraps |
//!
//! Lookups never move the current item; only `set_current` and `stop` do.

use crate::track::Track;
use crate::traits::PlayQueue;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the queue behaves at a track's end and at the queue's end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    /// Replay the current track when it finishes.
    One,
    /// Wrap around at either end of the queue.
    All,
}

#[derive(Debug, Default)]
struct QueueInner {
    tracks: Vec<Track>,
    current: Option<usize>,
    repeat: RepeatMode,
}

impl QueueInner {
    fn track_after(&self, index: usize) -> Option<Track> {
        if index + 1 < self.tracks.len() {
            self.tracks.get(index + 1).cloned()
        } else if self.repeat == RepeatMode::All {
            self.tracks.first().cloned()
        } else {
            None
        }
    }

    fn track_before(&self, index: usize) -> Option<Track> {
        if index > 0 {
            self.tracks.get(index - 1).cloned()
        } else if self.repeat == RepeatMode::All {
            self.tracks.last().cloned()
        } else {
            None
        }
    }
}

/// Thread-safe play queue held in memory.
#[derive(Debug, Default)]
pub struct InMemoryPlayQueue {
    inner: RwLock<QueueInner>,
}

impl InMemoryPlayQueue {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            inner: RwLock::new(QueueInner {
                tracks,
                ..Default::default()
            }),
        }
    }

    pub fn with_repeat(self, mode: RepeatMode) -> Self {
        self.set_repeat(mode);
        self
    }

    pub fn set_repeat(&self, mode: RepeatMode) {
        self.inner.write().repeat = mode;
    }

    pub fn repeat(&self) -> RepeatMode {
        self.inner.read().repeat
    }

    pub fn enqueue(&self, track: Track) {
        self.inner.write().tracks.push(track);
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.inner.read().tracks.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every track and clear the current item.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.tracks.clear();
        inner.current = None;
    }
}

impl PlayQueue for InMemoryPlayQueue {
    fn current_track(&self) -> Option<Track> {
        let inner = self.inner.read();
        inner.current.and_then(|i| inner.tracks.get(i).cloned())
    }

    fn subsequent(&self) -> Option<Track> {
        let inner = self.inner.read();
        let index = inner.current?;
        if inner.repeat == RepeatMode::One {
            return inner.tracks.get(index).cloned();
        }
        inner.track_after(index)
    }

    fn next(&self) -> Option<Track> {
        let inner = self.inner.read();
        match inner.current {
            Some(index) => inner.track_after(index),
            None => inner.tracks.first().cloned(),
        }
    }

    fn previous(&self) -> Option<Track> {
        let inner = self.inner.read();
        inner.current.and_then(|index| inner.track_before(index))
    }

    fn first(&self) -> Option<Track> {
        self.inner.read().tracks.first().cloned()
    }

    /// Tracks that are not in the queue yet are appended.
    fn set_current(&self, track: &Track) {
        let mut inner = self.inner.write();
        let index = match inner.tracks.iter().position(|t| t == track) {
            Some(index) => index,
            None => {
                debug!(track_id = %track.id, "Appending track to queue");
                inner.tracks.push(track.clone());
                inner.tracks.len() - 1
            }
        };
        inner.current = Some(index);
    }

    fn stop(&self) {
        self.inner.write().current = None;
    }
}
