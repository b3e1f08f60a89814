//! Platform-agnostic rendering engine contract
//!
//! Abstracts the audio output for different hosts. An engine turns a decoded
//! asset into single-use playback handles and exposes a monotonic clock.

use crate::types::AudioAsset;
use crate::volume::GainSink;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a playback handle
///
/// Allocated by the state machine, unique for the machine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(u64);

impl HandleId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// One-shot "finished" notification for a single handle
///
/// The engine keeps it alongside the handle and calls [`notify`](Self::notify)
/// exactly once: when playback reaches the end of the asset, or after
/// `stop()`. Consuming `self` makes a second notification impossible.
#[derive(Debug)]
pub struct FinishedNotifier {
    id: HandleId,
    tx: Sender<HandleId>,
}

impl FinishedNotifier {
    pub(crate) fn new(id: HandleId, tx: Sender<HandleId>) -> Self {
        Self { id, tx }
    }

    /// Handle this notifier belongs to
    pub fn handle_id(&self) -> HandleId {
        self.id
    }

    /// Deliver the notification
    ///
    /// Nothing happens if the state machine has been dropped.
    pub fn notify(self) {
        self.tx.send(self.id).ok();
    }
}

/// Single-use rendering session bound to one asset
pub trait PlaybackHandle {
    /// Start output at `offset` seconds into the asset
    ///
    /// Called at most once per handle.
    fn start(&mut self, offset: f64);

    /// Stop output
    ///
    /// Called at most once per handle, possibly before `start` or after a
    /// natural end. The handle's finished notification follows unless it
    /// already fired at natural end.
    fn stop(&mut self);
}

/// Host-provided audio rendering engine
pub trait RenderingEngine {
    type Handle: PlaybackHandle;

    /// Create a not-yet-started handle for `asset`, connected to `output`
    ///
    /// The engine must deliver `on_finished` exactly once for this handle.
    fn create_handle(
        &mut self,
        asset: &AudioAsset,
        output: &GainSink,
        on_finished: FinishedNotifier,
    ) -> Self::Handle;

    /// Monotonic engine clock in seconds
    fn current_time(&self) -> f64;
}
