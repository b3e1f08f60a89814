//! Tracklist Player - Playback Management
//!
//! Host-agnostic playback control for decoded audio tracks.
//!
//! This crate provides:
//! - Playback state machine (play/pause/stop/seek with asynchronous completion)
//! - Capacity-bounded track queue with a movable cursor
//! - Output gain with mute memory
//! - WAV decoding
//! - A player facade wiring the three together
//!
//! # Architecture
//!
//! `tracklist-playback` does not talk to audio hardware. The host supplies a
//! [`RenderingEngine`] that turns assets into single-use playback handles and
//! reports when each handle has finished. [`VirtualEngine`] is a simulated
//! engine with a manual clock for headless hosts and tests.
//!
//! Notifications are asynchronous: the host pumps them from its event loop
//! with [`PlaybackMachine::process_notifications`] (or
//! [`Player::process_notifications`]).
//!
//! # Example: Pause and resume
//!
//! ```rust
//! use tracklist_playback::{AudioAsset, GainControl, PlaybackMachine, PlaybackState, VirtualEngine};
//!
//! let gain = GainControl::default();
//! let mut machine = PlaybackMachine::new(VirtualEngine::new(), gain.sink());
//! machine.load(AudioAsset::silence(5.0, 1000, 1)?);
//!
//! machine.play();
//! machine.engine_mut().advance(2.0);
//! machine.pause();
//! machine.process_notifications();
//!
//! assert_eq!(machine.state(), PlaybackState::Paused);
//! assert_eq!(machine.current_time(), 2.0);
//! # Ok::<(), tracklist_playback::AssetError>(())
//! ```
//!
//! # Example: Queue navigation through the facade
//!
//! ```rust
//! use tracklist_playback::{AudioAsset, PlayerConfig, Player, Track, VirtualEngine, WavDecoder};
//!
//! let mut player = Player::new(VirtualEngine::new(), Box::new(WavDecoder), PlayerConfig::default())?;
//! player.load_track_to_rear(Track::new("intro", AudioAsset::silence(3.0, 1000, 1)?))?;
//! player.load_track_to_rear(Track::new("verse", AudioAsset::silence(4.0, 1000, 1)?))?;
//!
//! player.subscribe(|event| println!("{:?}", event));
//! player.play();
//! player.skip_backward(1);
//! assert_eq!(player.current_track().map(|t| t.id.as_str()), Some("verse"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod decoder;
mod engine;
mod error;
mod events;
mod machine;
mod player;
mod queue;
pub mod types;
mod virtual_engine;
mod volume;

// Public exports
pub use decoder::{Decoder, WavDecoder};
pub use engine::{FinishedNotifier, HandleId, PlaybackHandle, RenderingEngine};
pub use error::{AssetError, DecodeError, PlayerError, QueueError, Result, VolumeError};
pub use events::PlaybackEvent;
pub use machine::PlaybackMachine;
pub use player::Player;
pub use queue::TrackQueue;
pub use types::{AudioAsset, PlaybackState, PlayerConfig, Track};
pub use virtual_engine::{HandleRecord, VirtualEngine, VirtualHandle};
pub use volume::{GainControl, GainSink};
