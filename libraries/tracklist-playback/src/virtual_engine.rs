//! Simulated rendering engine
//!
//! Renders nothing and keeps time with a manually advanced clock. Used by
//! headless hosts (the CLI harness) and by tests to drive finished
//! notifications deterministically.

use crate::engine::{FinishedNotifier, HandleId, PlaybackHandle, RenderingEngine};
use crate::types::AudioAsset;
use crate::volume::GainSink;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Snapshot of one rendering session
#[derive(Debug, Clone, PartialEq)]
pub struct HandleRecord {
    pub id: HandleId,
    /// Asset duration in seconds
    pub duration: f64,
    /// Offset passed to `start`
    pub start_offset: Option<f64>,
    /// Engine clock when `start` was called
    pub started_at: Option<f64>,
    pub stopped: bool,
    pub ended_naturally: bool,
    /// Whether the finished notification has been sent
    pub notified: bool,
    /// Gain of the connected sink at snapshot time, or when the session
    /// was pruned
    pub gain: f32,
}

#[derive(Debug)]
struct Session {
    id: HandleId,
    duration: f64,
    output: GainSink,
    start_offset: Option<f64>,
    started_at: Option<f64>,
    stopped: bool,
    ended_naturally: bool,
    notifier: Option<FinishedNotifier>,
}

impl Session {
    fn is_running(&self) -> bool {
        self.started_at.is_some() && !self.stopped && !self.ended_naturally
    }

    fn ends_by(&self, now: f64) -> bool {
        if !self.is_running() {
            return false;
        }
        match (self.started_at, self.start_offset) {
            (Some(at), Some(offset)) => at + (self.duration - offset).max(0.0) <= now,
            _ => false,
        }
    }

    fn end_naturally(&mut self) {
        self.ended_naturally = true;
        if let Some(notifier) = self.notifier.take() {
            debug!(handle = %self.id, "Virtual session reached end of asset");
            notifier.notify();
        }
    }

    fn record(&self) -> HandleRecord {
        HandleRecord {
            id: self.id,
            duration: self.duration,
            start_offset: self.start_offset,
            started_at: self.started_at,
            stopped: self.stopped,
            ended_naturally: self.ended_naturally,
            notified: self.notifier.is_none(),
            gain: self.output.gain(),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    clock: f64,
    /// Sessions that still owe their finished notification
    sessions: Vec<Session>,
    /// Sessions whose notification has been sent, oldest first
    pruned: Vec<HandleRecord>,
}

impl Shared {
    fn session_mut(&mut self, id: HandleId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    fn pruned_mut(&mut self, id: HandleId) -> Option<&mut HandleRecord> {
        self.pruned.iter_mut().find(|r| r.id == id)
    }

    /// Move notified sessions into the record log
    ///
    /// Drops their sink and sender; only a snapshot stays behind.
    fn prune(&mut self) {
        let (done, live): (Vec<Session>, Vec<Session>) = std::mem::take(&mut self.sessions)
            .into_iter()
            .partition(|s| s.notifier.is_none());
        self.sessions = live;
        self.pruned.extend(done.iter().map(Session::record));
    }
}

/// Rendering engine with a manual clock
#[derive(Debug, Default)]
pub struct VirtualEngine {
    shared: Rc<RefCell<Shared>>,
}

impl VirtualEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `seconds`
    ///
    /// Running sessions whose asset end has been reached fire their finished
    /// notification. Returns how many did.
    pub fn advance(&mut self, seconds: f64) -> usize {
        let mut shared = self.shared.borrow_mut();
        if seconds.is_finite() && seconds > 0.0 {
            shared.clock += seconds;
        }
        let now = shared.clock;

        let mut ended = 0;
        for session in shared.sessions.iter_mut() {
            if session.ends_by(now) {
                session.end_naturally();
                ended += 1;
            }
        }
        shared.prune();
        ended
    }

    /// Force a running session to its natural end
    ///
    /// Returns `false` if the handle is unknown or not running.
    pub fn finish(&mut self, id: HandleId) -> bool {
        let mut shared = self.shared.borrow_mut();
        match shared.session_mut(id) {
            Some(session) if session.is_running() => {
                session.end_naturally();
                shared.prune();
                true
            }
            _ => false,
        }
    }

    /// Current clock in seconds
    pub fn now(&self) -> f64 {
        self.shared.borrow().clock
    }

    /// All sessions created so far, oldest first
    pub fn handles(&self) -> Vec<HandleRecord> {
        let shared = self.shared.borrow();
        let mut records: Vec<HandleRecord> = shared
            .pruned
            .iter()
            .cloned()
            .chain(shared.sessions.iter().map(Session::record))
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }

    pub fn handle(&self, id: HandleId) -> Option<HandleRecord> {
        let shared = self.shared.borrow();
        shared
            .sessions
            .iter()
            .find(|s| s.id == id)
            .map(Session::record)
            .or_else(|| shared.pruned.iter().find(|r| r.id == id).cloned())
    }

    /// Number of sessions still holding a sink and a notifier
    pub fn live_sessions(&self) -> usize {
        self.shared.borrow().sessions.len()
    }

    /// Number of sessions currently producing output
    pub fn running_handles(&self) -> usize {
        self.shared
            .borrow()
            .sessions
            .iter()
            .filter(|s| s.is_running())
            .count()
    }
}

impl RenderingEngine for VirtualEngine {
    type Handle = VirtualHandle;

    fn create_handle(
        &mut self,
        asset: &AudioAsset,
        output: &GainSink,
        on_finished: FinishedNotifier,
    ) -> VirtualHandle {
        let id = on_finished.handle_id();
        self.shared.borrow_mut().sessions.push(Session {
            id,
            duration: asset.duration(),
            output: output.clone(),
            start_offset: None,
            started_at: None,
            stopped: false,
            ended_naturally: false,
            notifier: Some(on_finished),
        });

        VirtualHandle {
            id,
            shared: Rc::clone(&self.shared),
        }
    }

    fn current_time(&self) -> f64 {
        self.now()
    }
}

/// Handle into a [`VirtualEngine`] session
///
/// # Panics
///
/// Starting or stopping the same handle twice panics, as does starting a
/// handle that was already stopped: the engine contract forbids both, and
/// the virtual engine exists to catch such misuse.
#[derive(Debug)]
pub struct VirtualHandle {
    id: HandleId,
    shared: Rc<RefCell<Shared>>,
}

impl PlaybackHandle for VirtualHandle {
    fn start(&mut self, offset: f64) {
        let mut shared = self.shared.borrow_mut();
        let clock = shared.clock;
        let Some(session) = shared.session_mut(self.id) else {
            panic!("{} started after finishing", self.id);
        };
        assert!(
            session.started_at.is_none(),
            "{} started twice",
            session.id
        );
        session.start_offset = Some(offset);
        session.started_at = Some(clock);
    }

    fn stop(&mut self) {
        let mut shared = self.shared.borrow_mut();
        if let Some(session) = shared.session_mut(self.id) {
            assert!(!session.stopped, "{} stopped twice", session.id);
            session.stopped = true;
            if let Some(notifier) = session.notifier.take() {
                notifier.notify();
            }
            shared.prune();
        } else if let Some(record) = shared.pruned_mut(self.id) {
            // Ended naturally earlier; no second notification
            assert!(!record.stopped, "{} stopped twice", record.id);
            record.stopped = true;
        }
    }
}
