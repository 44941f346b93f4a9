//! Track value type shared by every playback component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tracks shorter than this are never scrobbled.
pub const MIN_SCROBBLE_DURATION: Duration = Duration::from_secs(30);

/// A playable audio file with the metadata playback needs.
///
/// Two tracks are equal when their ids are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Stable identity (also the key of the profiles store)
    pub id: String,
    /// Location of the audio file
    pub path: PathBuf,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Total length; zero when unknown
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl Track {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, duration: Duration) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            title: None,
            artist: None,
            duration,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scrobble services need a title, an artist and a track longer than 30s.
    pub fn can_be_scrobbled(&self) -> bool {
        let has_text = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
        has_text(&self.title) && has_text(&self.artist) && self.duration > MIN_SCROBBLE_DURATION
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.artist, &self.title) {
            (Some(artist), Some(title)) => write!(f, "{} - {}", artist, title),
            (None, Some(title)) => f.write_str(title),
            _ => f.write_str(&self.id),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
