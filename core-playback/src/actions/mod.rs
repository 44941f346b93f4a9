//! # Chain Actions
//!
//! The individual steps the transition chains are assembled from.
//!
//! | Action | Chains | Side effect |
//! |--------|--------|-------------|
//! | [`SavePlaybackProfileAction`] | start | remember the outgoing track's position |
//! | [`LastFmScrobbleAction`] | start | submit the outgoing track (spawned) |
//! | [`HaltPlaybackAction`] | start, stop | stop the player, release the live context |
//! | [`AudioFilePreparationAction`] | start | open the requested file |
//! | [`ApplyPlaybackProfileAction`] | start | resolve the start position |
//! | [`StartPlaybackAction`] | start | mark the track current, start the player |
//! | `PredictiveTrackPreparationAction` | start | prefetch the subsequent track (spawned) |
//! | [`MarkLastPlaybackPositionAction`] | stop | record where playback stopped |
//! | [`EndPlaybackSequenceAction`] | stop | clear the queue's current item |
//!
//! Only preparation and player start can terminate a chain. Everything else
//! always proceeds and logs its failures.

mod apply_profile;
mod audio_file_preparation;
mod end_sequence;
mod halt;
mod mark_last_position;
#[cfg(feature = "predictive-preparation")]
mod predictive;
mod save_profile;
mod scrobble;
mod start;

pub use apply_profile::ApplyPlaybackProfileAction;
pub use audio_file_preparation::AudioFilePreparationAction;
pub use end_sequence::EndPlaybackSequenceAction;
pub use halt::HaltPlaybackAction;
pub use mark_last_position::MarkLastPlaybackPositionAction;
#[cfg(feature = "predictive-preparation")]
pub use predictive::PredictiveTrackPreparationAction;
pub use save_profile::SavePlaybackProfileAction;
pub use scrobble::{is_scrobble_eligible, LastFmScrobbleAction};
pub use start::StartPlaybackAction;
