//! Player facade
//!
//! Wires the track queue, the playback state machine and the gain control
//! together behind the host-facing surface. The queue decides which track is
//! current; the machine plays whatever the queue's current track is.

use crate::{
    decoder::Decoder,
    engine::RenderingEngine,
    error::Result,
    events::PlaybackEvent,
    machine::PlaybackMachine,
    queue::TrackQueue,
    types::{PlaybackState, PlayerConfig, Track},
    volume::GainControl,
};
use tracing::{debug, info};

type Listener = Box<dyn FnMut(&PlaybackEvent)>;

#[derive(Debug, Clone, Copy)]
enum End {
    Front,
    Rear,
}

/// Host-facing audio player
///
/// Everything is constructed up front: the engine, the decoder and the
/// configuration are passed in, nothing is created lazily.
pub struct Player<E: RenderingEngine> {
    machine: PlaybackMachine<E>,
    queue: TrackQueue,
    gain: GainControl,
    decoder: Box<dyn Decoder>,
    listeners: Vec<Listener>,

    /// Events waiting to be dispatched to listeners
    outbox: Vec<PlaybackEvent>,
}

impl<E: RenderingEngine> Player<E> {
    pub fn new(engine: E, decoder: Box<dyn Decoder>, config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        let gain = GainControl::new(config.initial_volume)?;
        let machine = PlaybackMachine::new(engine, gain.sink());
        info!(
            queue_capacity = config.queue_capacity,
            volume = config.initial_volume,
            "Player initialized"
        );

        Ok(Self {
            machine,
            queue: TrackQueue::new(config.queue_capacity),
            gain,
            decoder,
            listeners: Vec::new(),
            outbox: Vec::new(),
        })
    }

    /// Register a listener for every event the player emits
    pub fn subscribe(&mut self, listener: impl FnMut(&PlaybackEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ===== Loading =====

    /// Decode `bytes` and add the track at the front of the queue
    pub fn load(&mut self, id: impl Into<String>, bytes: &[u8]) -> Result<()> {
        let asset = self.decoder.decode(bytes)?;
        self.insert(Track::new(id, asset), End::Front)
    }

    /// Decode `bytes` and add the track at the rear of the queue
    pub fn load_to_rear(&mut self, id: impl Into<String>, bytes: &[u8]) -> Result<()> {
        let asset = self.decoder.decode(bytes)?;
        self.insert(Track::new(id, asset), End::Rear)
    }

    /// Add an already decoded track at the front of the queue
    pub fn load_track(&mut self, track: Track) -> Result<()> {
        self.insert(track, End::Front)
    }

    /// Add an already decoded track at the rear of the queue
    pub fn load_track_to_rear(&mut self, track: Track) -> Result<()> {
        self.insert(track, End::Rear)
    }

    /// Stop playback and empty the queue
    pub fn clear(&mut self) {
        let previous = self.current_id();
        self.machine.unload();
        self.queue.clear();
        self.push_event(PlaybackEvent::QueueChanged { length: 0 });
        if previous.is_some() {
            self.push_event(PlaybackEvent::TrackChanged {
                track_id: None,
                previous_track_id: previous,
            });
        }
        self.dispatch();
    }

    // ===== Playback Control =====

    pub fn play(&mut self) {
        self.machine.play();
        self.dispatch();
    }

    pub fn resume(&mut self) {
        self.machine.resume();
        self.dispatch();
    }

    pub fn pause(&mut self) {
        self.machine.pause();
        self.dispatch();
    }

    pub fn stop(&mut self) {
        self.machine.stop();
        self.dispatch();
    }

    pub fn seek(&mut self, to: f64) {
        self.machine.seek(to);
        self.dispatch();
    }

    pub fn seek_and_play(&mut self, to: f64) {
        self.machine.seek_and_play(to);
        self.dispatch();
    }

    /// Move the cursor `by` tracks toward the front
    ///
    /// When the current track changes, its session is discarded and the new
    /// track starts from zero, playing only if the player was playing.
    pub fn skip_forward(&mut self, by: usize) -> Option<&Track> {
        let previous = self.current_id();
        self.queue.move_current_forward(by);
        self.sync_current(previous);
        self.dispatch();
        self.queue.current_track()
    }

    /// Move the cursor `by` tracks toward the rear
    pub fn skip_backward(&mut self, by: usize) -> Option<&Track> {
        let previous = self.current_id();
        self.queue.move_current_back(by);
        self.sync_current(previous);
        self.dispatch();
        self.queue.current_track()
    }

    /// Deliver pending finished notifications from the engine
    ///
    /// Hosts call this from their event loop.
    pub fn process_notifications(&mut self) -> usize {
        let delivered = self.machine.process_notifications();
        self.dispatch();
        delivered
    }

    // ===== Volume =====

    /// Set volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.gain.set(volume)?;
        self.volume_changed();
        Ok(())
    }

    pub fn max_volume(&mut self) {
        self.gain.max();
        self.volume_changed();
    }

    pub fn mute(&mut self) {
        self.gain.mute();
        self.volume_changed();
    }

    pub fn unmute(&mut self) {
        self.gain.unmute();
        self.volume_changed();
    }

    pub fn toggle_mute(&mut self) {
        self.gain.toggle_mute();
        self.volume_changed();
    }

    /// Volume that applies once unmuted
    pub fn volume(&self) -> f32 {
        self.gain.volume()
    }

    pub fn is_muted(&self) -> bool {
        self.gain.is_muted()
    }

    // ===== State =====

    pub fn state(&self) -> PlaybackState {
        self.machine.state()
    }

    pub fn current_time(&self) -> f64 {
        self.machine.current_time()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current_track()
    }

    pub fn queue(&self) -> &TrackQueue {
        &self.queue
    }

    pub fn gain(&self) -> &GainControl {
        &self.gain
    }

    pub fn engine(&self) -> &E {
        self.machine.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.machine.engine_mut()
    }

    // ===== Internal =====

    fn insert(&mut self, track: Track, end: End) -> Result<()> {
        let previous = self.current_id();
        debug!(id = %track.id, ?end, "Loading track");
        match end {
            End::Front => self.queue.add_to_front(track)?,
            End::Rear => self.queue.add_to_rear(track)?,
        }

        self.push_event(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
        self.sync_current(previous);
        self.dispatch();
        Ok(())
    }

    /// Reload the machine if the queue's current track changed
    fn sync_current(&mut self, previous: Option<String>) {
        let current = self.queue.current_track().cloned();
        let current_id = current.as_ref().map(|track| track.id.clone());
        if current_id == previous {
            return;
        }

        let resume = matches!(
            self.machine.state(),
            PlaybackState::Playing | PlaybackState::SeekingThenPlay
        );
        self.machine.unload();
        if let Some(track) = current {
            self.machine.load(track.asset);
            if resume {
                self.machine.play();
            }
        }

        self.push_event(PlaybackEvent::TrackChanged {
            track_id: current_id,
            previous_track_id: previous,
        });
    }

    fn current_id(&self) -> Option<String> {
        self.queue.current_track().map(|track| track.id.clone())
    }

    fn volume_changed(&mut self) {
        self.push_event(PlaybackEvent::VolumeChanged {
            volume: self.gain.volume(),
            is_muted: self.gain.is_muted(),
        });
        self.dispatch();
    }

    /// Queue a facade event behind everything the machine emitted so far
    fn push_event(&mut self, event: PlaybackEvent) {
        self.outbox.extend(self.machine.drain_events());
        self.outbox.push(event);
    }

    fn dispatch(&mut self) {
        self.outbox.extend(self.machine.drain_events());
        for event in std::mem::take(&mut self.outbox) {
            for listener in &mut self.listeners {
                listener(&event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::WavDecoder;
    use crate::types::AudioAsset;
    use crate::virtual_engine::VirtualEngine;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn player() -> Player<VirtualEngine> {
        Player::new(
            VirtualEngine::new(),
            Box::new(WavDecoder),
            PlayerConfig::default(),
        )
        .unwrap()
    }

    fn track(id: &str, duration: f64) -> Track {
        Track::new(id, AudioAsset::silence(duration, 1000, 1).unwrap())
    }

    fn record(player: &mut Player<VirtualEngine>) -> Rc<RefCell<Vec<PlaybackEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        player.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn rejects_invalid_config() {
        let config = PlayerConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(Player::new(VirtualEngine::new(), Box::new(WavDecoder), config).is_err());
    }

    #[test]
    fn first_track_becomes_current() {
        let mut player = player();
        let events = record(&mut player);
        player.load_track(track("a", 3.0)).unwrap();

        assert_eq!(player.current_track().unwrap().id, "a");
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert_eq!(
            events.borrow().as_slice(),
            &[
                PlaybackEvent::QueueChanged { length: 1 },
                PlaybackEvent::AssetLoaded { duration: 3.0 },
                PlaybackEvent::TrackChanged {
                    track_id: Some("a".to_string()),
                    previous_track_id: None,
                },
            ]
        );
    }

    #[test]
    fn later_tracks_leave_cursor() {
        let mut player = player();
        player.load_track(track("a", 3.0)).unwrap();
        player.play();
        player.load_track_to_rear(track("b", 3.0)).unwrap();

        assert_eq!(player.current_track().unwrap().id, "a");
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[test]
    fn skip_keeps_playing() {
        let mut player = player();
        player.load_track(track("a", 3.0)).unwrap();
        player.load_track(track("b", 4.0)).unwrap();
        player.play();
        player.engine_mut().advance(1.0);

        assert_eq!(player.skip_forward(1).unwrap().id, "b");
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(player.engine().running_handles(), 1);

        // Stopped session of "a" must not disturb "b"
        player.process_notifications();
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[test]
    fn skip_while_paused_stays_stopped() {
        let mut player = player();
        player.load_track_to_rear(track("a", 3.0)).unwrap();
        player.load_track_to_rear(track("b", 3.0)).unwrap();
        player.seek(1.0);
        assert_eq!(player.state(), PlaybackState::Paused);

        assert_eq!(player.skip_backward(1).unwrap().id, "b");
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert_eq!(player.current_time(), 0.0);
    }

    #[test]
    fn skip_at_boundary_changes_nothing() {
        let mut player = player();
        player.load_track(track("a", 3.0)).unwrap();
        player.play();
        let events = record(&mut player);

        assert_eq!(player.skip_forward(5).unwrap().id, "a");
        assert!(events.borrow().is_empty());
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[test]
    fn clear_unloads() {
        let mut player = player();
        player.load_track(track("a", 3.0)).unwrap();
        player.play();
        player.clear();

        assert!(player.queue().is_empty());
        assert!(player.current_track().is_none());
        assert_eq!(player.state(), PlaybackState::Stopped);

        // Commands on an empty player are silent
        let events = record(&mut player);
        player.play();
        player.seek(1.0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn queue_full_surfaces_error() {
        let mut player = Player::new(
            VirtualEngine::new(),
            Box::new(WavDecoder),
            PlayerConfig {
                queue_capacity: 1,
                ..Default::default()
            },
        )
        .unwrap();
        player.load_track(track("a", 1.0)).unwrap();
        assert!(matches!(
            player.load_track(track("b", 1.0)),
            Err(crate::error::PlayerError::Queue(
                crate::error::QueueError::Full { capacity: 1 }
            ))
        ));
    }

    #[test]
    fn volume_commands_emit_events() {
        let mut player = player();
        let events = record(&mut player);

        player.set_volume(0.5).unwrap();
        player.mute();
        assert!(player.set_volume(3.0).is_err());

        assert_eq!(player.volume(), 0.5);
        assert!(player.is_muted());
        assert_eq!(player.gain().current_volume(), 0.0);
        assert_eq!(
            events.borrow().as_slice(),
            &[
                PlaybackEvent::VolumeChanged {
                    volume: 0.5,
                    is_muted: false
                },
                PlaybackEvent::VolumeChanged {
                    volume: 0.5,
                    is_muted: true
                },
            ]
        );
    }

    #[test]
    fn sessions_connect_to_player_gain() {
        let mut player = player();
        player.set_volume(0.25).unwrap();
        player.load_track(track("a", 1.0)).unwrap();
        player.play();

        let record = player.engine().handles().pop().unwrap();
        assert_eq!(record.gain, 0.25);
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        let mut player = player();
        assert!(matches!(
            player.load("x", b"nope"),
            Err(crate::error::PlayerError::Decode(_))
        ));
        assert!(player.queue().is_empty());
    }
}
