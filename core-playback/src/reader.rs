//! # File Track Reader
//!
//! A [`TrackReader`] over local files, backed by Symphonia.
//!
//! ## Overview
//!
//! Preparing a track opens the file, probes its container, picks the first
//! decodable audio track and builds a decoder for it. All of that is
//! blocking work and runs on tokio's blocking pool.
//!
//! The reader keeps two slots:
//!
//! - **live**: the context of the track the player is using
//! - **prefetched**: a context warmed up for the track expected next
//!
//! Preparing a track that is sitting in the prefetch slot promotes it to
//! live without touching the file again. A prefetch never replaces or
//! closes the live context.

use crate::error::{PlaybackError, Result};
use crate::track::Track;
use crate::traits::TrackReader;
use async_trait::async_trait;
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, instrument, warn};

/// Extensions of containers that are always DRM protected.
const DRM_EXTENSIONS: &[&str] = &["m4p", "m4v"];

/// Stream properties of a prepared track.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInfo {
    pub track_id: String,
    /// Short codec name (e.g. "pcm_s16le", "mp3")
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    pub duration: Option<Duration>,
}

/// An opened file, ready to be decoded.
struct PreparedTrack {
    info: PreparedInfo,
    // Held open for the lifetime of the playback context
    _format: Box<dyn FormatReader>,
    _decoder: Box<dyn Decoder>,
}

#[derive(Default)]
struct Slots {
    live: Option<PreparedTrack>,
    prefetched: Option<PreparedTrack>,
}

/// Track reader for files on the local file system.
#[derive(Clone, Default)]
pub struct FileTrackReader {
    slots: Arc<Mutex<Slots>>,
}

impl FileTrackReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Info about the live context, if any.
    pub fn live(&self) -> Option<PreparedInfo> {
        self.slots.lock().live.as_ref().map(|p| p.info.clone())
    }

    /// Info about the prefetched context, if any.
    pub fn prefetched(&self) -> Option<PreparedInfo> {
        self.slots.lock().prefetched.as_ref().map(|p| p.info.clone())
    }

    async fn open_in_background(track: &Track) -> Result<PreparedTrack> {
        let path = track.path.clone();
        let track_id = track.id.clone();
        tokio::task::spawn_blocking(move || open(&path, track_id))
            .await
            .map_err(|e| PlaybackError::Io(std::io::Error::other(e)))?
    }
}

impl std::fmt::Debug for FileTrackReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTrackReader")
            .field("live", &self.live().map(|i| i.track_id))
            .field("prefetched", &self.prefetched().map(|i| i.track_id))
            .finish()
    }
}

#[async_trait]
impl TrackReader for FileTrackReader {
    #[instrument(skip_all, fields(track_id = %track.id))]
    async fn prepare_for_playback(&self, track: &Track) -> Result<()> {
        {
            let mut slots = self.slots.lock();
            if slots
                .prefetched
                .as_ref()
                .is_some_and(|p| p.info.track_id == track.id)
            {
                debug!("Promoting prefetched context");
                slots.live = slots.prefetched.take();
                return Ok(());
            }

            // Only one live decoding context may be open at a time
            if let Some(previous) = slots.live.take() {
                debug!(previous = %previous.info.track_id, "Releasing live context");
            }
        }

        let prepared = Self::open_in_background(track).await?;
        self.slots.lock().live = Some(prepared);
        Ok(())
    }

    #[instrument(skip_all, fields(track_id = %track.id))]
    async fn prefetch(&self, track: &Track) -> Result<()> {
        {
            let slots = self.slots.lock();
            let holds = |slot: &Option<PreparedTrack>| {
                slot.as_ref().is_some_and(|p| p.info.track_id == track.id)
            };
            if holds(&slots.live) || holds(&slots.prefetched) {
                return Ok(());
            }
        }

        let prepared = Self::open_in_background(track).await?;
        self.slots.lock().prefetched = Some(prepared);
        debug!("Prefetched");
        Ok(())
    }

    fn close_playback_context(&self, track: &Track) {
        let mut slots = self.slots.lock();
        if slots
            .live
            .as_ref()
            .is_some_and(|p| p.info.track_id == track.id)
        {
            debug!(track_id = %track.id, "Closing playback context");
            slots.live = None;
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn unsupported(path: &Path, reason: impl Into<String>) -> PlaybackError {
    PlaybackError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Open, probe and build a decoder for the file at `path`.
fn open(path: &Path, track_id: String) -> Result<PreparedTrack> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PlaybackError::FileNotFound {
            path: PathBuf::from(path),
        },
        _ => PlaybackError::Io(e),
    })?;

    let ext = extension(path);
    if ext
        .as_deref()
        .is_some_and(|ext| DRM_EXTENSIONS.contains(&ext))
    {
        return Err(PlaybackError::DrmProtected {
            path: path.to_path_buf(),
        });
    }

    let mut hint = Hint::new();
    if let Some(ext) = &ext {
        hint.with_extension(ext);
    }

    let mss = MediaSourceStream::new(Box::new(file) as Box<dyn MediaSource>, Default::default());
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| {
            let name = path.to_string_lossy();
            warn!(file = %strip_path(&name), error = %e, "Format probe failed");
            unsupported(path, e.to_string())
        })?;

    let format = probed.format;
    let params = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| t.codec_params.clone())
        .ok_or_else(|| PlaybackError::NoAudioTracks {
            path: path.to_path_buf(),
        })?;

    let codecs = symphonia::default::get_codecs();
    let decoder = codecs
        .make(&params, &DecoderOptions::default())
        .map_err(|e| unsupported(path, e.to_string()))?;

    let codec = codecs
        .get_codec(params.codec)
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let duration = params.time_base.zip(params.n_frames).map(|(base, frames)| {
        let time = base.calc_time(frames);
        Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac)
    });

    let info = PreparedInfo {
        track_id,
        codec,
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count()),
        duration,
    };
    debug!(?info, "Prepared file");

    Ok(PreparedTrack {
        info,
        _format: format,
        _decoder: decoder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Write a mono 16-bit PCM WAV of `frames` silent samples at 8 kHz.
    fn write_wav(frames: u32) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}.wav", uuid::Uuid::new_v4()));
        let data_len = frames * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&8000u32.to_le_bytes());
        bytes.extend_from_slice(&16000u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(44 + data_len as usize, 0);

        let mut file = File::create(&path).unwrap();
        file.write_all(&bytes).unwrap();
        path
    }

    fn write_text(ext: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}.{ext}", uuid::Uuid::new_v4()));
        std::fs::write(&path, "this is not audio, just a few words of text").unwrap();
        path
    }

    fn track(id: &str, path: &Path) -> Track {
        Track::new(id, path, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_prepares_wav() {
        let path = write_wav(8000);
        let reader = FileTrackReader::new();

        reader.prepare_for_playback(&track("w", &path)).await.unwrap();

        let info = reader.live().unwrap();
        assert_eq!(info.track_id, "w");
        assert_eq!(info.sample_rate, Some(8000));
        assert_eq!(info.channels, Some(1));
        assert_eq!(info.duration, Some(Duration::from_secs(1)));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file() {
        let path = std::env::temp_dir().join(format!("{}.mp3", uuid::Uuid::new_v4()));
        let err = FileTrackReader::new()
            .prepare_for_playback(&track("m", &path))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::FileNotFound { .. }));
        assert_eq!(err.file(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_unrecognized_content() {
        let path = write_text("txt");
        let err = FileTrackReader::new()
            .prepare_for_playback(&track("t", &path))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::UnsupportedFormat { .. }));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_drm_protected_extension() {
        let path = write_text("m4p");
        let err = FileTrackReader::new()
            .prepare_for_playback(&track("d", &path))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::DrmProtected { .. }));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_prefetch_is_promoted_and_kept_apart_from_live() {
        let live_path = write_wav(800);
        let next_path = write_wav(1600);
        let reader = FileTrackReader::new();
        let live = track("live", &live_path);
        let next = track("next", &next_path);

        reader.prepare_for_playback(&live).await.unwrap();
        reader.prefetch(&next).await.unwrap();
        assert_eq!(reader.live().unwrap().track_id, "live");
        assert_eq!(reader.prefetched().unwrap().track_id, "next");

        // The file is gone, so success proves the prefetched context was reused
        std::fs::remove_file(&next_path).unwrap();
        reader.prepare_for_playback(&next).await.unwrap();
        assert_eq!(reader.live().unwrap().track_id, "next");
        assert!(reader.prefetched().is_none());
        std::fs::remove_file(live_path).ok();
    }

    #[tokio::test]
    async fn test_live_context_released_before_opening_next() {
        let path = write_wav(800);
        let reader = FileTrackReader::new();
        reader.prepare_for_playback(&track("old", &path)).await.unwrap();
        assert_eq!(reader.live().unwrap().track_id, "old");

        let missing = std::env::temp_dir().join(format!("{}.wav", uuid::Uuid::new_v4()));
        let err = reader
            .prepare_for_playback(&track("new", &missing))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::FileNotFound { .. }));
        assert!(reader.live().is_none());
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let path = write_wav(800);
        let reader = FileTrackReader::new();
        let t = track("c", &path);

        reader.prepare_for_playback(&t).await.unwrap();
        reader.close_playback_context(&t);
        reader.close_playback_context(&t);
        assert!(reader.live().is_none());

        // Closing a track that is not live leaves the live context alone
        reader.prepare_for_playback(&t).await.unwrap();
        reader.close_playback_context(&track("other", &path));
        assert!(reader.live().is_some());
        std::fs::remove_file(path).ok();
    }
}
