//! End-to-end tests for PlaybackMachine
//!
//! Drives the state machine against the virtual engine:
//! - Pause/resume position tracking
//! - Idempotent commands
//! - Stale notifications from superseded handles
//! - Seek clamping and structural settling
//! - Natural end of asset

use tracklist_playback::{
    AudioAsset, GainSink, PlaybackEvent, PlaybackMachine, PlaybackState, VirtualEngine,
};

// ============================================================================
// Test Infrastructure
// ============================================================================

fn asset(duration: f64) -> AudioAsset {
    AudioAsset::silence(duration, 1000, 1).unwrap()
}

fn loaded(duration: f64) -> PlaybackMachine<VirtualEngine> {
    let mut machine = PlaybackMachine::new(VirtualEngine::new(), GainSink::new(1.0));
    machine.load(asset(duration));
    machine.drain_events();
    machine
}

fn state_trail(machine: &mut PlaybackMachine<VirtualEngine>) -> Vec<PlaybackState> {
    machine
        .drain_events()
        .iter()
        .filter_map(PlaybackEvent::state)
        .collect()
}

// ============================================================================
// Pause / resume
// ============================================================================

#[test]
fn test_pause_resume_tracks_engine_clock() {
    let mut machine = loaded(5.0);

    machine.play();
    machine.engine_mut().advance(2.0);
    machine.pause();
    machine.process_notifications();

    assert_eq!(machine.state(), PlaybackState::Paused);
    assert_eq!(machine.current_time(), 2.0);

    machine.play();
    let record = machine.engine().handles().pop().unwrap();
    assert_eq!(record.start_offset, Some(2.0));
    assert_eq!(machine.state(), PlaybackState::Playing);

    assert_eq!(
        state_trail(&mut machine),
        vec![
            PlaybackState::Playing,
            PlaybackState::Pausing,
            PlaybackState::Paused,
            PlaybackState::Playing,
        ]
    );
}

#[test]
fn test_position_accumulates_across_cycles() {
    let mut machine = loaded(10.0);

    for _ in 0..3 {
        machine.play();
        machine.engine_mut().advance(1.5);
        machine.pause();
        machine.process_notifications();
    }

    assert_eq!(machine.current_time(), 4.5);
}

#[test]
fn test_resume_is_play() {
    let mut machine = loaded(5.0);
    machine.resume();
    assert_eq!(machine.state(), PlaybackState::Playing);
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_double_play_creates_no_second_handle() {
    let mut machine = loaded(5.0);

    machine.play();
    let handles = machine.engine().handles().len();
    let active = machine.active_handle();

    machine.play();
    assert_eq!(machine.state(), PlaybackState::Playing);
    assert_eq!(machine.engine().handles().len(), handles);
    assert_eq!(machine.active_handle(), active);
    assert_eq!(machine.engine().running_handles(), 1);
}

#[test]
fn test_repeated_pause_and_stop_are_silent() {
    let mut machine = loaded(5.0);
    machine.play();
    machine.pause();
    machine.pause();
    machine.process_notifications();
    machine.pause();

    assert_eq!(
        state_trail(&mut machine),
        vec![
            PlaybackState::Playing,
            PlaybackState::Pausing,
            PlaybackState::Paused
        ]
    );

    machine.stop();
    machine.stop();
    machine.process_notifications();
    machine.stop();
    assert_eq!(
        state_trail(&mut machine),
        vec![PlaybackState::Stopping, PlaybackState::Stopped]
    );
}

#[test]
fn test_stop_when_stopped_is_noop() {
    let mut machine = loaded(5.0);
    machine.stop();
    machine.pause();
    assert!(!machine.has_pending_events());
}

// ============================================================================
// Stale notifications
// ============================================================================

#[test]
fn test_load_supersedes_pending_notification() {
    let mut machine = loaded(5.0);
    machine.play();
    machine.engine_mut().advance(1.0);
    machine.pause();
    assert_eq!(machine.state(), PlaybackState::Pausing);

    // Asset B arrives before A's pause notification is delivered
    machine.load(asset(8.0));
    machine.play();
    assert_eq!(machine.state(), PlaybackState::Playing);

    // A's pause plus the stops of two never-started handles, all stale
    assert_eq!(machine.process_notifications(), 3);
    assert_eq!(machine.state(), PlaybackState::Playing);
    assert_eq!(machine.duration(), Some(8.0));
}

#[test]
fn test_load_stops_running_session() {
    let mut machine = loaded(5.0);
    machine.play();
    let first = machine.active_handle().unwrap();

    machine.load(asset(3.0));
    assert!(machine.engine().handle(first).unwrap().stopped);
    assert_eq!(machine.engine().running_handles(), 0);

    // Load does not change the state
    assert_eq!(machine.state(), PlaybackState::Playing);
    machine.process_notifications();
    assert_eq!(machine.state(), PlaybackState::Playing);
}

#[test]
fn test_load_while_playing_recovers_on_next_play() {
    let mut machine = loaded(5.0);
    machine.play();
    machine.engine_mut().advance(1.0);
    machine.load(asset(10.0));
    machine.process_notifications();
    machine.engine_mut().advance(100.0);
    machine.process_notifications();

    // Nothing renders, so the position stays where load froze it
    assert_eq!(machine.state(), PlaybackState::Playing);
    assert_eq!(machine.current_time(), 1.0);
    assert_eq!(machine.engine().running_handles(), 0);
    state_trail(&mut machine);

    machine.play();
    assert_eq!(machine.state(), PlaybackState::Playing);
    assert_eq!(machine.engine().running_handles(), 1);
    assert_eq!(
        machine.engine().handles().pop().unwrap().start_offset,
        Some(0.0)
    );
    assert_eq!(
        state_trail(&mut machine),
        vec![PlaybackState::Stopped, PlaybackState::Playing]
    );

    machine.engine_mut().advance(10.0);
    machine.process_notifications();
    assert_eq!(machine.state(), PlaybackState::Stopped);
}

#[test]
fn test_load_while_playing_then_stop_settles() {
    let mut machine = loaded(5.0);
    machine.play();
    machine.load(asset(3.0));

    machine.stop();
    assert_eq!(machine.state(), PlaybackState::Stopped);
    assert_eq!(machine.current_time(), 0.0);
}

#[test]
fn test_every_retired_handle_is_stopped() {
    let mut machine = loaded(5.0);
    machine.load(asset(6.0));
    machine.play();

    // Natural end, then a seek and a fresh play
    machine.engine_mut().advance(6.0);
    machine.process_notifications();
    machine.seek(2.0);
    machine.play();
    machine.unload();

    let handles = machine.engine().handles();
    assert_eq!(handles.len(), 4);
    for record in &handles {
        assert!(record.stopped, "{} discarded without stop", record.id);
        assert!(record.notified, "{} never notified", record.id);
    }
    assert_eq!(machine.engine().live_sessions(), 0);
}

#[test]
fn test_natural_end_of_superseded_handle_ignored() {
    let mut machine = loaded(2.0);
    machine.play();
    let first = machine.active_handle().unwrap();

    // Pause and resume before anything is delivered
    machine.pause();
    machine.play();

    // Old handle already stopped, new one runs from 0
    assert!(!machine.engine_mut().finish(first));
    machine.process_notifications();
    assert_eq!(machine.state(), PlaybackState::Playing);

    machine.engine_mut().advance(2.0);
    machine.process_notifications();
    assert_eq!(machine.state(), PlaybackState::Stopped);
}

// ============================================================================
// Seek
// ============================================================================

#[test]
fn test_seek_clamps_to_asset_bounds() {
    let mut machine = loaded(10.0);

    machine.seek(-5.0);
    assert_eq!(machine.current_time(), 0.0);

    machine.seek(15.0);
    assert_eq!(machine.current_time(), 10.0);
}

#[test]
fn test_seek_on_never_started_asset_does_not_wait() {
    let mut machine = loaded(10.0);
    machine.seek(3.0);

    assert_eq!(machine.state(), PlaybackState::Paused);
    assert_eq!(machine.engine().running_handles(), 0);
    assert_eq!(machine.process_notifications(), 0);
}

#[test]
fn test_seek_during_pausing_lands_paused_at_target() {
    let mut machine = loaded(10.0);
    machine.play();
    machine.engine_mut().advance(2.0);
    machine.pause();
    machine.seek(8.0);

    assert_eq!(machine.state(), PlaybackState::Seeking);
    machine.process_notifications();
    assert_eq!(machine.state(), PlaybackState::Paused);
    assert_eq!(machine.current_time(), 8.0);
}

#[test]
fn test_seek_and_play_while_playing() {
    let mut machine = loaded(10.0);
    machine.play();
    machine.engine_mut().advance(1.0);
    machine.seek_and_play(4.0);
    machine.process_notifications();

    assert_eq!(machine.state(), PlaybackState::Playing);
    machine.engine_mut().advance(1.0);
    assert_eq!(machine.current_time(), 5.0);

    assert_eq!(
        state_trail(&mut machine),
        vec![
            PlaybackState::Playing,
            PlaybackState::SeekingThenPlay,
            PlaybackState::Playing,
        ]
    );
}

#[test]
fn test_pause_during_seek_and_play() {
    let mut machine = loaded(10.0);
    machine.play();
    machine.seek_and_play(4.0);
    machine.pause();

    assert_eq!(machine.state(), PlaybackState::Pausing);
    machine.process_notifications();
    assert_eq!(machine.state(), PlaybackState::Paused);
    assert_eq!(machine.current_time(), 4.0);
}

#[test]
fn test_seek_to_end_then_play_finishes() {
    let mut machine = loaded(10.0);
    machine.seek_and_play(15.0);
    assert_eq!(machine.state(), PlaybackState::Playing);

    machine.engine_mut().advance(0.0);
    machine.process_notifications();
    assert_eq!(machine.state(), PlaybackState::Stopped);
    assert_eq!(machine.current_time(), 0.0);
}

// ============================================================================
// Time tracking
// ============================================================================

#[test]
fn test_current_time_monotonic_while_playing() {
    let mut machine = loaded(3.0);
    machine.play();

    let mut last = machine.current_time();
    for _ in 0..10 {
        machine.engine_mut().advance(0.25);
        let now = machine.current_time();
        assert!(now >= last);
        assert!(now <= 3.0);
        last = now;
    }
}

#[test]
fn test_natural_end_resets_and_replays_from_start() {
    let mut machine = loaded(2.0);
    machine.play();
    machine.engine_mut().advance(2.5);
    machine.process_notifications();

    assert_eq!(machine.state(), PlaybackState::Stopped);
    assert_eq!(machine.current_time(), 0.0);

    machine.play();
    assert_eq!(
        machine.engine().handles().pop().unwrap().start_offset,
        Some(0.0)
    );
}

#[test]
fn test_stop_from_paused_settles() {
    let mut machine = loaded(5.0);
    machine.seek(2.0);
    machine.stop();

    assert_eq!(machine.state(), PlaybackState::Stopped);
    assert_eq!(machine.current_time(), 0.0);
}
