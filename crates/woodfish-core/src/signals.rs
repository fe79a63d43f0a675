//! Sensory feedback port: tap sound and haptic pulses.
//!
//! Implementations must return immediately; the engine never waits on or
//! inspects them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

pub trait TapSignals: Send {
    /// Play the wood-block cue for one tap.
    fn play_tap_cue(&mut self);

    /// Vibrate for `duration` where the platform supports it.
    fn haptic_pulse(&mut self, duration: Duration);

    /// Called whenever the user toggles sound.
    fn set_sound_enabled(&mut self, _enabled: bool) {}
}

/// Discards every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSignals;

impl TapSignals for SilentSignals {
    fn play_tap_cue(&mut self) {}

    fn haptic_pulse(&mut self, _duration: Duration) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    TapCue,
    Haptic(Duration),
    Sound(bool),
}

/// Records signals into a shared log; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSignals {
    log: Arc<Mutex<Vec<Signal>>>,
}

impl RecordingSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn push(&self, signal: Signal) {
        if let Ok(mut log) = self.log.lock() {
            log.push(signal);
        }
    }
}

impl TapSignals for RecordingSignals {
    fn play_tap_cue(&mut self) {
        self.push(Signal::TapCue);
    }

    fn haptic_pulse(&mut self, duration: Duration) {
        self.push(Signal::Haptic(duration));
    }

    fn set_sound_enabled(&mut self, enabled: bool) {
        self.push(Signal::Sound(enabled));
    }
}
