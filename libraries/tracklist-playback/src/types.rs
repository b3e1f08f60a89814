//! Core types for playback management

use crate::error::{AssetError, PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Playback state
///
/// `Pausing`, `Stopping`, `Seeking` and `SeekingThenPlay` are transitional:
/// they are left when the rendering engine reports that the session they
/// stopped has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackState {
    /// Rendering session running
    Playing,

    /// Session stopped, position kept
    Paused,

    /// Nothing playing, position at zero
    #[default]
    Stopped,

    /// Waiting for the session to finish before settling in `Paused`
    Pausing,

    /// Waiting for the session to finish before settling in `Stopped`
    Stopping,

    /// Waiting for the session to finish before settling in `Paused` at the new position
    Seeking,

    /// Waiting for the session to finish before playing from the new position
    SeekingThenPlay,
}

impl PlaybackState {
    /// Whether a finished notification is expected to complete this state
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            Self::Pausing | Self::Stopping | Self::Seeking | Self::SeekingThenPlay
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
            Self::Stopped => "STOPPED",
            Self::Pausing => "PAUSING",
            Self::Stopping => "STOPPING",
            Self::Seeking => "SEEKING",
            Self::SeekingThenPlay => "SEEKING_THEN_PLAY",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable decoded audio
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`, shared behind an `Arc`
/// so cloning an asset never copies audio data.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
    duration: f64,
}

impl AudioAsset {
    /// Largest sample count [`silence`](Self::silence) will allocate
    pub const MAX_SILENCE_SAMPLES: usize = 1 << 28;

    /// Wrap interleaved samples
    pub fn from_interleaved(
        samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
    ) -> std::result::Result<Self, AssetError> {
        if sample_rate == 0 {
            return Err(AssetError::ZeroSampleRate);
        }
        if channels == 0 {
            return Err(AssetError::ZeroChannels);
        }
        if samples.len() % channels as usize != 0 {
            return Err(AssetError::PartialFrame {
                samples: samples.len(),
                channels,
            });
        }

        let frames = samples.len() / channels as usize;
        let duration = frames as f64 / f64::from(sample_rate);

        Ok(Self {
            samples: samples.into(),
            sample_rate,
            channels,
            duration,
        })
    }

    /// Silent asset of roughly `duration` seconds
    ///
    /// Negative and NaN durations produce an empty asset. Durations needing
    /// more than [`MAX_SILENCE_SAMPLES`](Self::MAX_SILENCE_SAMPLES) samples,
    /// infinity included, fail with [`AssetError::TooLong`].
    pub fn silence(
        duration: f64,
        sample_rate: u32,
        channels: u16,
    ) -> std::result::Result<Self, AssetError> {
        let duration = if duration.is_nan() {
            0.0
        } else {
            duration.max(0.0)
        };
        let frames = (duration * f64::from(sample_rate)).round();
        let samples = frames * f64::from(channels);
        if samples > Self::MAX_SILENCE_SAMPLES as f64 {
            return Err(AssetError::TooLong {
                limit: Self::MAX_SILENCE_SAMPLES,
            });
        }

        Self::from_interleaved(vec![0.0; samples as usize], sample_rate, channels)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Whether both assets share the same decoded buffer
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
    }
}

/// A loaded track
///
/// `id` must be unique within a queue.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: String,
    pub asset: AudioAsset,
}

impl Track {
    pub fn new(id: impl Into<String>, asset: AudioAsset) -> Self {
        Self {
            id: id.into(),
            asset,
        }
    }

    /// Duration of the underlying asset in seconds
    pub fn duration(&self) -> f64 {
        self.asset.duration()
    }
}

/// Configuration for the player facade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Maximum number of queued tracks (default: 100)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Initial linear gain, 0.0 to 1.0 (default: 1.0)
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,
}

impl PlayerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(PlayerError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(PlayerError::Config(format!(
                "initial_volume must be between 0 and 1, got {}",
                self.initial_volume
            )));
        }

        Ok(())
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            initial_volume: default_initial_volume(),
        }
    }
}

fn default_queue_capacity() -> usize {
    100
}

fn default_initial_volume() -> f32 {
    1.0
}
