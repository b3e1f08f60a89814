//! Playback state machine - core orchestration
//!
//! Owns the single active rendering session, the elapsed-time counter and
//! the playback state, and reconciles commands with the engine's
//! asynchronous finished notifications.

use crate::{
    engine::{FinishedNotifier, HandleId, PlaybackHandle, RenderingEngine},
    events::PlaybackEvent,
    types::{AudioAsset, PlaybackState},
    volume::GainSink,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info};

/// Lifecycle of the handle owned by the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleStatus {
    /// Created, never started
    Idle,
    /// Started, not stopped by us
    Running,
    /// `stop()` issued, finished notification outstanding
    Stopping,
    /// Finished notification received
    Finished,
}

struct ActiveHandle<H> {
    id: HandleId,
    handle: H,
    status: HandleStatus,
    /// `stop()` has been called on `handle`
    stop_issued: bool,
}

impl<H: PlaybackHandle> ActiveHandle<H> {
    fn start(&mut self, offset: f64) {
        self.handle.start(offset);
        self.status = HandleStatus::Running;
    }

    /// Stop the session if it is running
    ///
    /// Returns whether a finished notification is still to come.
    fn halt(&mut self) -> bool {
        match self.status {
            HandleStatus::Running => {
                self.handle.stop();
                self.stop_issued = true;
                self.status = HandleStatus::Stopping;
                true
            }
            HandleStatus::Stopping => true,
            HandleStatus::Idle | HandleStatus::Finished => false,
        }
    }

    fn is_running(&self) -> bool {
        self.status == HandleStatus::Running
    }
}

/// Playback state machine
///
/// Every `load`/`play` installs a fresh handle; a finished notification is
/// matched against the installed handle's [`HandleId`] and dropped if it
/// belongs to a superseded one. The transition it triggers depends only on
/// the machine's state at delivery:
///
/// | state             | result                        |
/// |-------------------|-------------------------------|
/// | `Seeking`         | `Paused`                      |
/// | `SeekingThenPlay` | `play()`                      |
/// | `Pausing`         | `Paused`                      |
/// | `Stopping`        | `Stopped`, elapsed reset      |
/// | `Playing`         | `Stopped`, elapsed reset      |
///
/// When a command would wait for a notification that cannot arrive (no
/// session running or stopping), the table is applied immediately. The same
/// holds for a state whose session was discarded by `load`: the next command
/// applies the table before doing its own work.
pub struct PlaybackMachine<E: RenderingEngine> {
    engine: E,
    output: GainSink,

    asset: Option<AudioAsset>,
    handle: Option<ActiveHandle<E::Handle>>,
    next_handle_id: u64,

    state: PlaybackState,

    /// Position in seconds, authoritative whenever not `Playing`
    elapsed: f64,

    /// Engine clock when the running session was started
    started_at: f64,

    finished_tx: Sender<HandleId>,
    finished_rx: Receiver<HandleId>,

    // Event queue for host synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<E: RenderingEngine> PlaybackMachine<E> {
    /// Create a machine rendering through `engine` into `output`
    pub fn new(engine: E, output: GainSink) -> Self {
        let (finished_tx, finished_rx) = unbounded();
        Self {
            engine,
            output,
            asset: None,
            handle: None,
            next_handle_id: 0,
            state: PlaybackState::Stopped,
            elapsed: 0.0,
            started_at: 0.0,
            finished_tx,
            finished_rx,
            pending_events: Vec::new(),
        }
    }

    // ===== Commands =====

    /// Replace the current asset
    ///
    /// Installs a fresh, unstarted handle. The old handle is stopped and
    /// any notification it still owes is ignored. The state is unchanged; a
    /// transition that was waiting on the old session, or a `Playing` state
    /// left without a session, completes on the next command. The position
    /// is frozen until then.
    pub fn load(&mut self, asset: AudioAsset) {
        info!(duration = asset.duration(), "Loading asset");
        let duration = asset.duration();
        if self.state == PlaybackState::Playing {
            self.elapsed = self.position();
        }
        self.asset = Some(asset);
        self.install_handle();
        self.pending_events
            .push(PlaybackEvent::AssetLoaded { duration });
    }

    /// Drop the asset and any session, settling in `Stopped` at zero
    pub fn unload(&mut self) {
        self.retire_handle();
        self.asset = None;
        self.elapsed = 0.0;
        if self.state != PlaybackState::Stopped {
            self.set_state(PlaybackState::Stopped);
        }
    }

    /// Start or resume playback from the elapsed position
    pub fn play(&mut self) {
        if self.asset.is_none() {
            return;
        }
        self.settle_orphaned();
        self.start_playback();
    }

    /// Alias for [`play`](Self::play)
    pub fn resume(&mut self) {
        self.play();
    }

    /// Pause playback, keeping the position
    pub fn pause(&mut self) {
        if self.asset.is_none() {
            return;
        }
        self.settle_orphaned();
        if matches!(
                self.state,
                PlaybackState::Paused
                    | PlaybackState::Pausing
                    | PlaybackState::Stopping
                    | PlaybackState::Stopped
            )
        {
            return;
        }

        if self.state == PlaybackState::Playing {
            self.elapsed = self.position();
        }
        self.set_state(PlaybackState::Pausing);
        self.halt_or_settle();
    }

    /// Stop playback and rewind to zero
    pub fn stop(&mut self) {
        if self.asset.is_none() {
            return;
        }
        self.settle_orphaned();
        if matches!(self.state, PlaybackState::Stopped | PlaybackState::Stopping) {
            return;
        }

        self.set_state(PlaybackState::Stopping);
        self.elapsed = 0.0;
        self.halt_or_settle();
    }

    /// Move to `to` seconds and settle in `Paused`
    ///
    /// Out-of-range targets are clamped to `[0, duration]`.
    pub fn seek(&mut self, to: f64) {
        let Some(duration) = self.duration() else {
            return;
        };
        self.settle_orphaned();

        self.elapsed = clamp_position(to, duration);
        self.set_state(PlaybackState::Seeking);
        self.halt_or_settle();
    }

    /// Move to `to` seconds and play from there
    pub fn seek_and_play(&mut self, to: f64) {
        let Some(duration) = self.duration() else {
            return;
        };
        self.settle_orphaned();

        self.elapsed = clamp_position(to, duration);
        self.set_state(PlaybackState::SeekingThenPlay);
        self.halt_or_settle();
    }

    // ===== Finished notifications =====

    /// Deliver every finished notification received so far
    ///
    /// Hosts call this from their event loop. Returns the number of
    /// notifications taken off the channel, stale ones included.
    pub fn process_notifications(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(id) = self.finished_rx.try_recv() {
            self.handle_finished(id);
            delivered += 1;
        }
        delivered
    }

    /// Deliver the finished notification of handle `id`
    pub fn handle_finished(&mut self, id: HandleId) {
        match self.handle.as_mut() {
            Some(active) if active.id == id => {
                if active.status == HandleStatus::Finished {
                    debug!(handle = %id, "Duplicate finished notification ignored");
                    return;
                }
                active.status = HandleStatus::Finished;
            }
            _ => {
                debug!(handle = %id, "Ignoring finished notification from superseded handle");
                return;
            }
        }

        debug!(handle = %id, state = %self.state, "Session finished");
        self.ended();
    }

    // ===== Accessors =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Playback position in seconds, never past the asset's end
    pub fn current_time(&self) -> f64 {
        self.position()
    }

    /// Duration of the loaded asset
    pub fn duration(&self) -> Option<f64> {
        self.asset.as_ref().map(AudioAsset::duration)
    }

    pub fn asset(&self) -> Option<&AudioAsset> {
        self.asset.as_ref()
    }

    pub fn has_asset(&self) -> bool {
        self.asset.is_some()
    }

    /// Identity of the installed handle
    pub fn active_handle(&self) -> Option<HandleId> {
        self.handle.as_ref().map(|active| active.id)
    }

    /// Sink new handles are connected to
    pub fn output(&self) -> &GainSink {
        &self.output
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internal =====

    /// Apply the finished-notification transition table
    fn ended(&mut self) {
        match self.state {
            PlaybackState::Seeking | PlaybackState::Pausing => {
                self.set_state(PlaybackState::Paused);
            }
            PlaybackState::SeekingThenPlay => self.start_playback(),
            PlaybackState::Stopping | PlaybackState::Playing => {
                self.elapsed = 0.0;
                self.set_state(PlaybackState::Stopped);
            }
            // Nothing in flight
            PlaybackState::Paused | PlaybackState::Stopped => {}
        }
    }

    fn start_playback(&mut self) {
        if self.state == PlaybackState::Playing {
            return;
        }
        let Some(duration) = self.duration() else {
            return;
        };

        // Handles are single-use: every start gets a fresh one
        self.install_handle();
        let offset = self.elapsed.min(duration);
        if let Some(active) = self.handle.as_mut() {
            active.start(offset);
            debug!(handle = %active.id, offset, "Started session");
        }
        self.started_at = self.engine.current_time();
        self.set_state(PlaybackState::Playing);
    }

    /// Settle a state whose session was discarded by `load`
    ///
    /// `load` keeps the state, so `Playing` or a transitional state can be
    /// left waiting on a handle that no longer reports.
    fn settle_orphaned(&mut self) {
        let in_flight = self.handle.as_ref().is_some_and(|active| {
            matches!(active.status, HandleStatus::Running | HandleStatus::Stopping)
        });
        let waiting = self.state.is_transitional() || self.state == PlaybackState::Playing;
        if waiting && !in_flight {
            debug!(state = %self.state, "Settling state orphaned by load");
            self.ended();
        }
    }

    /// Stop the session, or settle now if no notification can arrive
    fn halt_or_settle(&mut self) {
        let pending = self.handle.as_mut().is_some_and(ActiveHandle::halt);
        if !pending {
            debug!(state = %self.state, "No session to wait for, settling");
            self.ended();
        }
    }

    fn install_handle(&mut self) {
        self.retire_handle();
        let Some(asset) = self.asset.as_ref() else {
            return;
        };

        let id = HandleId::new(self.next_handle_id);
        self.next_handle_id += 1;

        let notifier = FinishedNotifier::new(id, self.finished_tx.clone());
        let handle = self.engine.create_handle(asset, &self.output, notifier);
        self.handle = Some(ActiveHandle {
            id,
            handle,
            status: HandleStatus::Idle,
            stop_issued: false,
        });
    }

    /// Stop and drop the installed handle, started or not
    ///
    /// Whatever notification this produces is stale by id.
    fn retire_handle(&mut self) {
        if let Some(mut old) = self.handle.take() {
            if !old.stop_issued {
                old.handle.stop();
            }
            debug!(handle = %old.id, status = ?old.status, "Retired handle");
        }
    }

    fn position(&self) -> f64 {
        let Some(duration) = self.duration() else {
            return 0.0;
        };

        let mut position = self.elapsed;
        let running = self.handle.as_ref().is_some_and(ActiveHandle::is_running);
        if self.state == PlaybackState::Playing && running {
            position += (self.engine.current_time() - self.started_at).max(0.0);
        }
        position.min(duration)
    }

    fn set_state(&mut self, state: PlaybackState) {
        debug!(from = %self.state, to = %state, "Playback state transition");
        self.state = state;
        self.pending_events
            .push(PlaybackEvent::StateChanged { state });
    }
}

fn clamp_position(to: f64, duration: f64) -> f64 {
    if to.is_nan() {
        0.0
    } else {
        to.clamp(0.0, duration)
    }
}
