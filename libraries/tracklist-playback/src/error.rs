//! Error types for playback management

use thiserror::Error;

/// Track queue errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Queue holds `capacity` tracks already
    #[error("Track list limit has been reached ({capacity} tracks)")]
    Full { capacity: usize },

    /// A track with this id is already queued
    #[error("Track already in queue: {0}")]
    DuplicateTrack(String),
}

/// Gain control errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VolumeError {
    /// Volume outside `0.0..=1.0`
    #[error("Invalid volume {0}: provide a value from 0 up to 1")]
    OutOfRange(f32),
}

/// Malformed decoded audio
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("Sample rate must be non-zero")]
    ZeroSampleRate,

    #[error("Channel count must be non-zero")]
    ZeroChannels,

    #[error("Sample count {samples} is not a multiple of {channels} channels")]
    PartialFrame { samples: usize, channels: u16 },

    /// Generated audio would exceed `limit` samples
    #[error("Asset too long: more than {limit} samples")]
    TooLong { limit: usize },
}

/// Decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The WAV reader rejected the buffer
    #[error("WAV decode failed: {0}")]
    Wav(#[from] hound::Error),

    /// Sample layout this decoder cannot handle
    #[error("Unsupported audio data: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Top-level player errors
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
