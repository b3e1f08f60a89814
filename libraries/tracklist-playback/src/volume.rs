//! Output gain with mute memory
//!
//! Gain is linear, 0.0 (silence) to 1.0 (unity). Rendering sessions are
//! connected to a [`GainSink`]; the host adjusts it through [`GainControl`].

use crate::error::VolumeError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared gain stage that rendering sessions are connected to
///
/// Clones refer to the same stage. The value is stored as `f32` bits in an
/// atomic so the host and the engine never need a lock.
#[derive(Debug, Clone)]
pub struct GainSink(Arc<AtomicU32>);

impl GainSink {
    pub fn new(gain: f32) -> Self {
        Self(Arc::new(AtomicU32::new(gain.to_bits())))
    }

    /// Current linear gain
    pub fn gain(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn set_gain(&self, gain: f32) {
        self.0.store(gain.to_bits(), Ordering::Relaxed);
    }

    /// Whether both sinks are the same stage
    pub fn same_stage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Volume controller
///
/// Muting writes silence to the sink and remembers the last audible volume;
/// volume changes while muted only update that memory.
#[derive(Debug, Clone)]
pub struct GainControl {
    sink: GainSink,

    /// Mute state (preserves volume level)
    muted: bool,

    /// Volume restored on unmute
    last_known_volume: f32,
}

impl GainControl {
    /// Silence
    pub const MIN: f32 = 0.0;

    /// Unity gain
    pub const MAX: f32 = 1.0;

    /// Create new volume controller
    pub fn new(volume: f32) -> Result<Self, VolumeError> {
        let volume = Self::check(volume)?;
        Ok(Self {
            sink: GainSink::new(volume),
            muted: false,
            last_known_volume: volume,
        })
    }

    /// Sink to connect rendering sessions to
    pub fn sink(&self) -> GainSink {
        self.sink.clone()
    }

    /// Gain currently applied to the output
    pub fn current_volume(&self) -> f32 {
        self.sink.gain()
    }

    /// Volume that applies once unmuted
    pub fn volume(&self) -> f32 {
        self.last_known_volume
    }

    pub fn at_max_volume(&self) -> bool {
        self.current_volume() == Self::MAX
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.unmute();
        } else {
            self.mute();
        }
    }

    /// Mute audio, remembering the current volume
    pub fn mute(&mut self) {
        if self.muted {
            return;
        }
        self.last_known_volume = self.sink.gain();
        self.sink.set_gain(Self::MIN);
        self.muted = true;
        debug!(restore = self.last_known_volume, "Muted output");
    }

    /// Unmute audio (restores previous volume)
    pub fn unmute(&mut self) {
        if !self.muted {
            return;
        }
        self.muted = false;
        self.sink.set_gain(self.last_known_volume);
        debug!(volume = self.last_known_volume, "Unmuted output");
    }

    /// Set volume (0.0 to 1.0)
    pub fn set(&mut self, volume: f32) -> Result<(), VolumeError> {
        let volume = Self::check(volume)?;
        self.last_known_volume = volume;
        if !self.muted {
            self.sink.set_gain(volume);
        }
        Ok(())
    }

    /// Set volume to unity gain
    pub fn max(&mut self) {
        self.last_known_volume = Self::MAX;
        if !self.muted {
            self.sink.set_gain(Self::MAX);
        }
    }

    fn check(volume: f32) -> Result<f32, VolumeError> {
        if (Self::MIN..=Self::MAX).contains(&volume) {
            Ok(volume)
        } else {
            Err(VolumeError::OutOfRange(volume))
        }
    }
}

impl Default for GainControl {
    fn default() -> Self {
        Self {
            sink: GainSink::new(Self::MAX),
            muted: false,
            last_known_volume: Self::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_volume() {
        let vol = GainControl::new(0.8).unwrap();
        assert_eq!(vol.current_volume(), 0.8);
        assert!(!vol.is_muted());
        assert!(!vol.at_max_volume());
        assert!(GainControl::default().at_max_volume());
    }

    #[test]
    fn rejects_out_of_range() {
        let mut vol = GainControl::default();
        assert_eq!(vol.set(1.5), Err(VolumeError::OutOfRange(1.5)));
        assert_eq!(vol.set(-0.1), Err(VolumeError::OutOfRange(-0.1)));
        assert!(vol.set(f32::NAN).is_err());
        assert!(GainControl::new(2.0).is_err());

        // Unchanged after rejection
        assert_eq!(vol.current_volume(), 1.0);
    }

    #[test]
    fn mute_unmute_restores_last_volume() {
        let mut vol = GainControl::new(0.6).unwrap();

        vol.mute();
        assert!(vol.is_muted());
        assert_eq!(vol.current_volume(), 0.0);
        assert_eq!(vol.volume(), 0.6);

        vol.unmute();
        assert!(!vol.is_muted());
        assert_eq!(vol.current_volume(), 0.6);
    }

    #[test]
    fn set_while_muted_only_updates_memory() {
        let mut vol = GainControl::new(0.6).unwrap();
        vol.mute();
        vol.set(0.3).unwrap();
        assert_eq!(vol.current_volume(), 0.0);

        vol.unmute();
        assert_eq!(vol.current_volume(), 0.3);
    }

    #[test]
    fn toggle_mute() {
        let mut vol = GainControl::new(0.5).unwrap();
        vol.toggle_mute();
        assert!(vol.is_muted());
        vol.toggle_mute();
        assert!(!vol.is_muted());
        assert_eq!(vol.current_volume(), 0.5);
    }

    #[test]
    fn max_volume() {
        let mut vol = GainControl::new(0.2).unwrap();
        vol.max();
        assert!(vol.at_max_volume());

        vol.mute();
        vol.set(0.4).unwrap();
        vol.max();
        assert_eq!(vol.current_volume(), 0.0);
        vol.unmute();
        assert!(vol.at_max_volume());
    }

    #[test]
    fn sink_clones_share_stage() {
        let mut vol = GainControl::new(0.5).unwrap();
        let sink = vol.sink();
        assert!(sink.same_stage(&vol.sink()));
        assert!(!sink.same_stage(&GainSink::new(0.5)));

        vol.set(0.25).unwrap();
        assert_eq!(sink.gain(), 0.25);
    }
}
