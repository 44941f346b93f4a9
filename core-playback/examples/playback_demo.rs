//! # Playback Transition Demo
//!
//! Drives the playback delegate over real files with a console "player".
//!
//! Run with: `cargo run --example playback_demo --package core-playback -- a.mp3 b.flac`
//!
//! Without arguments, two short silent WAV files are generated in the temp
//! directory (plus one path that does not exist, to show a failed transition).

use anyhow::{Context, Result};
use core_playback::{
    FileTrackReader, InMemoryPlayQueue, PlaybackDelegate, PlaybackParams, PlaybackState, Player,
    Track,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::EventStream;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A player that only remembers what it was told.
#[derive(Default)]
struct ConsolePlayer {
    state: Mutex<(PlaybackState, Duration)>,
}

impl Player for ConsolePlayer {
    fn state(&self) -> PlaybackState {
        self.state.lock().0
    }

    fn seek_position(&self) -> Duration {
        self.state.lock().1
    }

    fn play(&self, track: &Track, start: Duration) -> core_playback::Result<()> {
        info!(track = %track, start_ms = start.as_millis() as u64, "▶ play");
        *self.state.lock() = (PlaybackState::Playing, start);
        Ok(())
    }

    fn stop(&self) {
        info!("■ stop");
        *self.state.lock() = (PlaybackState::Stopped, Duration::ZERO);
    }

    fn pause(&self) {
        self.state.lock().0 = PlaybackState::Paused;
    }

    fn resume(&self) {
        self.state.lock().0 = PlaybackState::Playing;
    }
}

fn silent_wav(name: &str, secs: u32) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("{name}.wav"));
    let data_len = secs * 8000 * 2;
    let mut bytes = Vec::new();
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
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let args: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    let paths = match args.is_empty() {
        false => args,
        true => vec![
            silent_wav("mpc-demo-first", 3)?,
            std::env::temp_dir().join("mpc-demo-missing.mp3"),
            silent_wav("mpc-demo-last", 2)?,
        ],
    };

    let tracks: Vec<Track> = paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let title = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Track::new(format!("track-{i}"), path, Duration::from_secs(3)).with_title(title)
        })
        .collect();

    let config = CoreConfig::builder().enable_scrobbling(false).build()?;
    let delegate = PlaybackDelegate::builder()
        .player(Arc::new(ConsolePlayer::default()))
        .queue(Arc::new(InMemoryPlayQueue::new(tracks.clone())))
        .track_reader(Arc::new(FileTrackReader::new()))
        .config(config)
        .build()?;

    let mut events = EventStream::new(delegate.subscribe());
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let json = serde_json::to_string(&event).unwrap_or_default();
            info!(severity = ?event.severity(), "event: {}", json);
        }
    });

    delegate.begin_playback().await?;
    for track in tracks.iter().skip(1).cloned() {
        if let Some(outcome) = delegate.play(track, PlaybackParams::default()).await? {
            info!(?outcome, "Transition finished");
        }
    }
    delegate.previous_track().await?;

    if let (Some(track), Some(session)) = (delegate.playing_track(), delegate.current_session()) {
        delegate.track_playback_completed(&track, session).await?;
    }
    delegate.stop().await;

    info!(
        profiles = %serde_json::to_string(&delegate.profiles().snapshot())?,
        "Final profiles"
    );

    drop(delegate);
    printer.await?;
    Ok(())
}
