//! # Playback Delegate
//!
//! The entry point hosts talk to. Turns user commands and player signals
//! into request contexts and runs the matching chain.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core_playback::delegate::PlaybackDelegate;
//! use core_playback::queue::InMemoryPlayQueue;
//! use core_playback::traits::{Player, TrackReader};
//! use std::sync::Arc;
//!
//! # async fn example(player: Arc<dyn Player>, reader: Arc<dyn TrackReader>) -> core_playback::Result<()> {
//! let delegate = PlaybackDelegate::builder()
//!     .player(player)
//!     .queue(Arc::new(InMemoryPlayQueue::new(Vec::new())))
//!     .track_reader(reader)
//!     .build()?;
//!
//! let _events = delegate.subscribe();
//! delegate.begin_playback().await?;
//! # Ok(())
//! # }
//! ```

use crate::chain::{
    ChainOutcome, ChainServices, StartPlaybackChain, StopPlaybackChain,
    TrackPlaybackCompletedChain,
};
use crate::config::{PlaybackPreferences, SharedPreferences};
use crate::context::{PlaybackParams, PlaybackRequestContext, PlaybackSessions, RequestId};
use crate::error::Result;
use crate::profiles::{PlaybackProfile, PlaybackProfiles};
use crate::track::Track;
use crate::traits::{PlayQueue, Player, ScrobbleClient, TrackReader};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackState, ProfileEvent, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Facade over the playback chains of one player.
pub struct PlaybackDelegate {
    services: ChainServices,
    start: Arc<StartPlaybackChain>,
    stop: Arc<StopPlaybackChain>,
    completed: TrackPlaybackCompletedChain,
}

impl PlaybackDelegate {
    pub fn builder() -> PlaybackDelegateBuilder {
        PlaybackDelegateBuilder::default()
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.services.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.services.events
    }

    pub fn profiles(&self) -> &Arc<PlaybackProfiles> {
        &self.services.profiles
    }

    pub fn preferences(&self) -> &SharedPreferences {
        &self.services.preferences
    }

    pub fn sessions(&self) -> &Arc<PlaybackSessions> {
        &self.services.sessions
    }

    /// The track loaded in the player, if any.
    pub fn playing_track(&self) -> Option<Track> {
        if self.services.player.state().is_playing_or_paused() {
            self.services.queue.current_track()
        } else {
            None
        }
    }

    fn capture(&self, requested: Option<Track>, params: PlaybackParams) -> PlaybackRequestContext {
        PlaybackRequestContext::capture(
            self.services.player.as_ref(),
            self.services.queue.as_ref(),
            requested,
            params,
        )
    }

    /// Play `track`.
    ///
    /// Returns `Ok(None)` when the request was ignored because a track is
    /// loaded and `params.interrupt_playback` is `false`.
    #[instrument(skip_all, fields(track_id = %track.id))]
    pub async fn play(&self, track: Track, params: PlaybackParams) -> Result<Option<ChainOutcome>> {
        let context = self.capture(Some(track), params);
        if !context.params().interrupt_playback && context.current_state().is_playing_or_paused() {
            debug!("Not interrupting current playback");
            return Ok(None);
        }
        self.start.execute(&context).await.map(Some)
    }

    /// Start the queue from its first track.
    pub async fn begin_playback(&self) -> Result<Option<ChainOutcome>> {
        match self.services.queue.first() {
            Some(track) => self.play(track, PlaybackParams::default()).await,
            None => Ok(None),
        }
    }

    /// Whether a transition is loading or a track is loaded.
    ///
    /// A start from a stopped player leaves it reporting `Stopped` until the
    /// new track plays, so the in-flight marker counts as active too.
    fn is_active(&self) -> bool {
        self.services.player.state().is_playing_or_paused()
            || self.services.sessions.in_flight().is_some()
    }

    /// Skip forward. Does nothing while idle or at the end of the queue.
    pub async fn next_track(&self) -> Result<Option<ChainOutcome>> {
        if !self.is_active() {
            return Ok(None);
        }
        match self.services.queue.next() {
            Some(track) => self.play(track, PlaybackParams::default()).await,
            None => Ok(None),
        }
    }

    /// Skip back. Does nothing while idle or at the start of the queue.
    pub async fn previous_track(&self) -> Result<Option<ChainOutcome>> {
        if !self.is_active() {
            return Ok(None);
        }
        match self.services.queue.previous() {
            Some(track) => self.play(track, PlaybackParams::default()).await,
            None => Ok(None),
        }
    }

    /// Stop playback, superseding any transition still in flight.
    ///
    /// Returns `None` when the player was stopped and nothing was loading.
    pub async fn stop(&self) -> Option<ChainOutcome> {
        if !self.is_active() {
            return None;
        }
        let context = self.capture(None, PlaybackParams::default());
        Some(self.stop.execute(&context).await)
    }

    /// Stopped begins playback, playing pauses, paused resumes.
    pub async fn toggle_play_pause(&self) -> Result<Option<ChainOutcome>> {
        match self.services.player.state() {
            PlaybackState::Stopped => self.begin_playback().await,
            PlaybackState::Playing => {
                self.services.player.pause();
                Ok(None)
            }
            PlaybackState::Paused => {
                self.services.player.resume();
                Ok(None)
            }
        }
    }

    /// The request that started the loaded track.
    ///
    /// Hosts hand it back to [`track_playback_completed`](Self::track_playback_completed).
    pub fn current_session(&self) -> Option<RequestId> {
        self.services.sessions.playing_session()
    }

    /// The player finished `track` on its own.
    ///
    /// `session` is the [`current_session`](Self::current_session) observed
    /// when the track started. A signal from any other session is stale and
    /// only resets that track's remembered position.
    #[instrument(skip_all, fields(track_id = %track.id, session = %session))]
    pub async fn track_playback_completed(
        &self,
        track: &Track,
        session: RequestId,
    ) -> Result<Option<ChainOutcome>> {
        let state = self.services.player.state();
        let still_playing =
            state.is_playing_or_paused() && self.current_session() == Some(session);

        if !still_playing {
            debug!("Stale completion signal");
            self.save_profile_if_allowed(track, Duration::ZERO);
            return Ok(None);
        }

        let context = PlaybackRequestContext::new(
            Some(track.clone()),
            state,
            track.duration,
            None,
            PlaybackParams::default(),
        );
        self.completed.execute(&context).await.map(Some)
    }

    /// Remember the playing track's position, regardless of preferences.
    pub fn save_playback_profile(&self) -> Option<PlaybackProfile> {
        let track = self.playing_track()?;
        let profile = PlaybackProfile::for_track(&track, self.services.player.seek_position());
        self.services.profiles.set(profile.clone());
        self.emit_saved(&profile);
        Some(profile)
    }

    /// Forget the playing track's position.
    pub fn delete_playback_profile(&self) -> Option<PlaybackProfile> {
        let track = self.playing_track()?;
        let removed = self.services.profiles.remove(&track)?;
        self.services
            .emit(CoreEvent::Profile(ProfileEvent::Deleted {
                track_id: removed.track_id.clone(),
            }));
        Some(removed)
    }

    /// Record the playing track's position before the host exits.
    pub fn on_app_exit(&self) {
        let Some(track) = self.playing_track() else {
            return;
        };
        let position = self.services.player.seek_position();
        self.services.profiles.mark_last_position(&track, position);
        self.save_profile_if_allowed(&track, position);
        info!(track_id = %track.id, "Saved playback state on exit");
    }

    fn save_profile_if_allowed(&self, track: &Track, position: Duration) {
        let preferences = self.services.preferences.read().clone();
        if let Some(profile) = self
            .services
            .profiles
            .save_if_allowed(track, position, &preferences)
        {
            self.emit_saved(&profile);
        }
    }

    fn emit_saved(&self, profile: &PlaybackProfile) {
        self.services
            .emit(CoreEvent::Profile(ProfileEvent::Saved {
                track_id: profile.track_id.clone(),
                position_ms: profile.position_ms(),
            }));
    }
}

impl std::fmt::Debug for PlaybackDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackDelegate")
            .field("services", &self.services)
            .field("in_flight", &self.services.sessions.in_flight())
            .finish()
    }
}

/// Builder for [`PlaybackDelegate`].
///
/// The player, queue and track reader are required; everything else has a
/// default.
#[derive(Default)]
pub struct PlaybackDelegateBuilder {
    player: Option<Arc<dyn Player>>,
    queue: Option<Arc<dyn PlayQueue>>,
    reader: Option<Arc<dyn TrackReader>>,
    scrobbler: Option<Arc<dyn ScrobbleClient>>,
    profiles: Option<Arc<PlaybackProfiles>>,
    preferences: Option<SharedPreferences>,
    events: Option<EventBus>,
    config: CoreConfig,
}

impl PlaybackDelegateBuilder {
    pub fn player(mut self, player: Arc<dyn Player>) -> Self {
        self.player = Some(player);
        self
    }

    pub fn queue(mut self, queue: Arc<dyn PlayQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn track_reader(mut self, reader: Arc<dyn TrackReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn scrobbler(mut self, scrobbler: Arc<dyn ScrobbleClient>) -> Self {
        self.scrobbler = Some(scrobbler);
        self
    }

    pub fn profiles(mut self, profiles: Arc<PlaybackProfiles>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn preferences(mut self, preferences: SharedPreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Publish on an existing bus instead of creating one.
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    /// # Errors
    ///
    /// Returns [`core_runtime::Error::CapabilityMissing`] when the player,
    /// queue or track reader was not provided.
    pub fn build(self) -> core_runtime::Result<PlaybackDelegate> {
        let player = self.player.ok_or_else(|| {
            core_runtime::Error::capability_missing("Player", "no audio player was provided")
        })?;
        let queue = self.queue.ok_or_else(|| {
            core_runtime::Error::capability_missing("PlayQueue", "no play queue was provided")
        })?;
        let reader = self.reader.ok_or_else(|| {
            core_runtime::Error::capability_missing("TrackReader", "no track reader was provided")
        })?;

        let services = ChainServices {
            player,
            queue,
            reader,
            scrobbler: self.scrobbler,
            profiles: self.profiles.unwrap_or_default(),
            preferences: self
                .preferences
                .unwrap_or_else(|| PlaybackPreferences::default().into_shared()),
            events: self
                .events
                .unwrap_or_else(|| EventBus::new(self.config.event_buffer_size)),
            features: self.config.features,
            sessions: Arc::new(PlaybackSessions::new()),
        };

        let start = Arc::new(StartPlaybackChain::new(&services));
        let stop = Arc::new(StopPlaybackChain::new(&services));
        let completed = TrackPlaybackCompletedChain::new(&services, start.clone(), stop.clone());

        Ok(PlaybackDelegate {
            services,
            start,
            stop,
            completed,
        })
    }
}
