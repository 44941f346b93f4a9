//! # Playback Preferences
//!
//! User-facing settings that change how transitions treat remembered
//! positions.

use core_runtime::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which tracks get their last playback position remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RememberLastPositionOption {
    /// Every outgoing track gets a profile.
    AllTracks,
    /// Only tracks that already have a profile are updated.
    #[default]
    IndividualTracks,
}

/// Playback preferences.
///
/// Hosts share one instance between the delegate and its chains through
/// [`SharedPreferences`], so changes apply to the next transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackPreferences {
    /// Master switch for saving and resuming positions. Default: `true`.
    pub remember_last_position: bool,
    /// Default: [`RememberLastPositionOption::IndividualTracks`].
    pub remember_last_position_option: RememberLastPositionOption,
}

impl Default for PlaybackPreferences {
    fn default() -> Self {
        Self {
            remember_last_position: true,
            remember_last_position_option: RememberLastPositionOption::default(),
        }
    }
}

impl PlaybackPreferences {
    /// Parse preferences from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid playback preferences: {}", e)))
    }

    /// Whether a profile should be written for a track.
    pub fn should_save_profile(&self, has_existing_profile: bool) -> bool {
        self.remember_last_position
            && (self.remember_last_position_option == RememberLastPositionOption::AllTracks
                || has_existing_profile)
    }

    /// Whether remembered positions are resumed.
    pub fn should_resume(&self) -> bool {
        self.remember_last_position
    }

    pub fn into_shared(self) -> SharedPreferences {
        Arc::new(RwLock::new(self))
    }
}

/// Preferences shared between the host and the playback core.
pub type SharedPreferences = Arc<RwLock<PlaybackPreferences>>;
