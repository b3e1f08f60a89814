//! Playback Events
//!
//! Event-based communication for host synchronization. Events are emitted at
//! key points:
//! - State changes (every transition of the state machine)
//! - Asset loads
//! - Current track changes (queue navigation)
//! - Volume and queue changes

use crate::types::PlaybackState;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// A new asset was loaded into the state machine
    AssetLoaded {
        /// Asset duration in seconds
        duration: f64,
    },

    /// The queue cursor now points at a different track
    TrackChanged {
        /// ID of the new current track (`None` once the queue is empty)
        track_id: Option<String>,
        /// ID of the previous current track
        previous_track_id: Option<String>,
    },

    /// Volume changed
    VolumeChanged {
        /// Linear gain that applies once unmuted (0.0-1.0)
        volume: f32,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Tracks were added or removed
    QueueChanged {
        /// New queue length
        length: usize,
    },
}

impl PlaybackEvent {
    /// The new state, for `StateChanged` events
    pub fn state(&self) -> Option<PlaybackState> {
        match self {
            Self::StateChanged { state } => Some(*state),
            _ => None,
        }
    }
}
