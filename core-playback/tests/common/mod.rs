//! Hand-written fakes shared by the integration tests.
//!
//! Every fake appends what it was asked to do to one shared log, so tests can
//! assert on the order of side effects across collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use core_playback::config::PlaybackPreferences;
use core_playback::{
    InMemoryPlayQueue, PlayQueue, PlaybackDelegate, PlaybackError, PlaybackParams,
    PlaybackState, Player, RequestId, Result, ScrobbleClient, Track, TrackReader,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventStream};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn track(id: &str, secs: u64) -> Track {
    Track::new(id, format!("/music/{id}.flac"), Duration::from_secs(secs))
        .with_title(format!("Title {id}"))
        .with_artist("Artist")
}

// ============================================================================
// Player
// ============================================================================

#[derive(Debug)]
struct PlayerState {
    state: PlaybackState,
    seek: Duration,
    loaded: Option<String>,
}

pub struct FakePlayer {
    inner: Mutex<PlayerState>,
    failing: Mutex<HashSet<String>>,
    log: Log,
}

impl FakePlayer {
    pub fn new(log: Log) -> Self {
        Self {
            inner: Mutex::new(PlayerState {
                state: PlaybackState::Stopped,
                seek: Duration::ZERO,
                loaded: None,
            }),
            failing: Mutex::default(),
            log,
        }
    }

    /// Pretend the player is mid-track.
    pub fn set_position(&self, state: PlaybackState, seek: Duration) {
        let mut inner = self.inner.lock();
        inner.state = state;
        inner.seek = seek;
    }

    pub fn fail_on(&self, track_id: &str) {
        self.failing.lock().insert(track_id.to_string());
    }

    pub fn loaded(&self) -> Option<String> {
        self.inner.lock().loaded.clone()
    }
}

impl Player for FakePlayer {
    fn state(&self) -> PlaybackState {
        self.inner.lock().state
    }

    fn seek_position(&self) -> Duration {
        self.inner.lock().seek
    }

    fn play(&self, track: &Track, start: Duration) -> Result<()> {
        if self.failing.lock().contains(&track.id) {
            return Err(PlaybackError::PlayerFailed("output device busy".to_string()));
        }
        let mut inner = self.inner.lock();
        inner.state = PlaybackState::Playing;
        inner.seek = start;
        inner.loaded = Some(track.id.clone());
        self.log
            .lock()
            .push(format!("player.play:{}@{}", track.id, start.as_secs()));
        Ok(())
    }

    fn stop(&self) {
        let mut inner = self.inner.lock();
        inner.state = PlaybackState::Stopped;
        inner.seek = Duration::ZERO;
        inner.loaded = None;
        self.log.lock().push("player.stop".to_string());
    }

    fn pause(&self) {
        self.inner.lock().state = PlaybackState::Paused;
        self.log.lock().push("player.pause".to_string());
    }

    fn resume(&self) {
        self.inner.lock().state = PlaybackState::Playing;
        self.log.lock().push("player.resume".to_string());
    }
}

// ============================================================================
// Track reader
// ============================================================================

/// Lets a test hold a track's preparation until it says so.
#[derive(Clone, Default)]
pub struct Hold {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

pub struct FakeReader {
    missing: Mutex<HashSet<String>>,
    holds: Mutex<HashMap<String, Hold>>,
    log: Log,
}

impl FakeReader {
    pub fn new(log: Log) -> Self {
        Self {
            missing: Mutex::default(),
            holds: Mutex::default(),
            log,
        }
    }

    pub fn missing(&self, track_id: &str) {
        self.missing.lock().insert(track_id.to_string());
    }

    pub fn hold(&self, track_id: &str) -> Hold {
        let hold = Hold::default();
        self.holds.lock().insert(track_id.to_string(), hold.clone());
        hold
    }
}

#[async_trait]
impl TrackReader for FakeReader {
    async fn prepare_for_playback(&self, track: &Track) -> Result<()> {
        self.log.lock().push(format!("reader.prepare:{}", track.id));

        let hold = self.holds.lock().get(&track.id).cloned();
        if let Some(hold) = hold {
            hold.started.notify_one();
            hold.release.notified().await;
        }

        if self.missing.lock().contains(&track.id) {
            return Err(PlaybackError::FileNotFound {
                path: track.path.clone(),
            });
        }
        Ok(())
    }

    async fn prefetch(&self, track: &Track) -> Result<()> {
        self.log.lock().push(format!("reader.prefetch:{}", track.id));
        Ok(())
    }

    fn close_playback_context(&self, track: &Track) {
        self.log.lock().push(format!("reader.close:{}", track.id));
    }
}

// ============================================================================
// Scrobbler
// ============================================================================

#[derive(Default)]
pub struct FakeScrobbler {
    pub submitted: Mutex<Vec<(String, Duration)>>,
    pub notify: Notify,
}

#[async_trait]
impl ScrobbleClient for FakeScrobbler {
    async fn scrobble_if_eligible(&self, track: &Track, played_for: Duration) -> Result<()> {
        self.submitted.lock().push((track.id.clone(), played_for));
        self.notify.notify_one();
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub log: Log,
    pub player: Arc<FakePlayer>,
    pub queue: Arc<InMemoryPlayQueue>,
    pub reader: Arc<FakeReader>,
    pub scrobbler: Arc<FakeScrobbler>,
    pub delegate: Arc<PlaybackDelegate>,
    pub events: EventStream,
}

impl Harness {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self::with(tracks, PlaybackPreferences::default(), CoreConfig::default())
    }

    pub fn with(tracks: Vec<Track>, preferences: PlaybackPreferences, config: CoreConfig) -> Self {
        let log: Log = Arc::default();
        let player = Arc::new(FakePlayer::new(log.clone()));
        let queue = Arc::new(InMemoryPlayQueue::new(tracks));
        let reader = Arc::new(FakeReader::new(log.clone()));
        let scrobbler = Arc::new(FakeScrobbler::default());

        let delegate = PlaybackDelegate::builder()
            .player(player.clone())
            .queue(queue.clone())
            .track_reader(reader.clone())
            .scrobbler(scrobbler.clone())
            .preferences(preferences.into_shared())
            .config(config)
            .build()
            .expect("all capabilities provided");
        let events = EventStream::new(delegate.subscribe());

        Self {
            log,
            player,
            queue,
            reader,
            scrobbler,
            delegate: Arc::new(delegate),
            events,
        }
    }

    /// Put `track` in the player as if it had been playing for `seek_secs`.
    pub fn playing(&self, track: &Track, seek_secs: u64) {
        self.queue.set_current(track);
        self.player
            .set_position(PlaybackState::Playing, Duration::from_secs(seek_secs));
    }

    /// Start `track` through the delegate at `seek_secs` and return the
    /// session that started it. Clears the log and pending events.
    pub async fn start(&mut self, track: &Track, seek_secs: u64) -> RequestId {
        let params = PlaybackParams::default().with_start_position(Duration::from_secs(seek_secs));
        let outcome = self
            .delegate
            .play(track.clone(), params)
            .await
            .expect("play succeeds")
            .expect("play not ignored");
        assert!(outcome.is_completed());
        settle().await;
        self.take_log();
        self.drain_events();
        self.delegate.current_session().expect("track started")
    }

    pub fn take_log(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock())
    }

    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        self.events.drain()
    }

    pub fn current_id(&self) -> Option<String> {
        self.queue.current_track().map(|t| t.id)
    }
}

/// Let spawned background tasks (prefetch, scrobble) run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
