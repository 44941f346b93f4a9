//! # Playback Error Types
//!
//! Errors raised while moving the player from one track to another.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during a playback transition.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // File Preparation Errors
    // ========================================================================
    /// The track's file does not exist.
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// The file exists but its container or codec cannot be decoded.
    #[error("Unsupported audio format in {}: {reason}", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// The file is protected by DRM.
    #[error("File is DRM protected: {}", .path.display())]
    DrmProtected { path: PathBuf },

    /// The container holds no decodable audio track.
    #[error("No audio tracks in {}", .path.display())]
    NoAudioTracks { path: PathBuf },

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// A start transition was requested without a track to play.
    #[error("No track was requested")]
    NoRequestedTrack,

    /// The requested track of a context may only be set once.
    #[error("Requested track already set for this request")]
    RequestedTrackAlreadySet,

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// The player refused to start the track.
    #[error("Player failed: {0}")]
    PlayerFailed(String),

    /// The scrobble service rejected a submission.
    #[error("Scrobble failed: {0}")]
    ScrobbleFailed(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the runtime layer (configuration, missing capabilities).
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl PlaybackError {
    /// Returns `true` if this error should be shown to the user when a track
    /// fails to play.
    pub fn is_displayable(&self) -> bool {
        matches!(
            self,
            PlaybackError::FileNotFound { .. }
                | PlaybackError::UnsupportedFormat { .. }
                | PlaybackError::DrmProtected { .. }
                | PlaybackError::NoAudioTracks { .. }
                | PlaybackError::NoRequestedTrack
                | PlaybackError::PlayerFailed(_)
        )
    }

    /// The offending file, for errors that refer to one.
    pub fn file(&self) -> Option<&Path> {
        match self {
            PlaybackError::FileNotFound { path }
            | PlaybackError::UnsupportedFormat { path, .. }
            | PlaybackError::DrmProtected { path }
            | PlaybackError::NoAudioTracks { path } => Some(path),
            _ => None,
        }
    }

    /// Short message suitable for a notification, without the file path.
    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::FileNotFound { .. } => "The file could not be found".to_string(),
            PlaybackError::UnsupportedFormat { .. } => {
                "The file's format is not supported".to_string()
            }
            PlaybackError::DrmProtected { .. } => "The file is DRM protected".to_string(),
            PlaybackError::NoAudioTracks { .. } => "The file contains no audio".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
