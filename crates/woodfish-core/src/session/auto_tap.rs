//! Auto-tap driver: one synthetic tap per cadence while enabled.
//!
//! Suspending cancels the pending tick outright, so nothing accumulated
//! while suspended fires late; resuming starts a fresh cadence.

use tracing::debug;

use crate::timer::TimerSlot;

#[derive(Debug, Clone)]
pub struct AutoTapDriver {
    enabled: bool,
    cadence_ms: u64,
    slot: TimerSlot,
}

impl AutoTapDriver {
    pub fn new(cadence_ms: u64) -> Self {
        Self {
            enabled: false,
            cadence_ms,
            slot: TimerSlot::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn due_at(&self) -> Option<u64> {
        self.slot.due_at()
    }

    pub fn enable(&mut self, now_ms: u64) {
        self.enabled = true;
        self.slot.arm(now_ms + self.cadence_ms);
        debug!(cadence_ms = self.cadence_ms, "auto-tap enabled");
    }

    pub fn disable(&mut self) {
        if self.enabled {
            debug!("auto-tap disabled");
        }
        self.enabled = false;
        self.slot.cancel();
    }

    pub fn suspend(&mut self) {
        self.slot.cancel();
    }

    pub fn resume(&mut self, now_ms: u64) {
        if self.enabled {
            self.slot.arm(now_ms + self.cadence_ms);
        }
    }

    /// Fire the next tick if due, scheduling the following one.
    /// Returns the instant the tap belongs to.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        let (_, due) = self.slot.fire_if_due(now_ms)?;
        self.slot.arm(due + self.cadence_ms);
        Some(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_on_cadence() {
        let mut driver = AutoTapDriver::new(1_000);
        driver.enable(0);
        assert_eq!(driver.poll(999), None);
        assert_eq!(driver.poll(1_000), Some(1_000));
        assert_eq!(driver.poll(1_500), None);
        assert_eq!(driver.poll(2_000), Some(2_000));
    }

    #[test]
    fn suspended_ticks_do_not_fire_late() {
        let mut driver = AutoTapDriver::new(1_000);
        driver.enable(0);
        driver.suspend();
        assert_eq!(driver.poll(10_000), None);
        driver.resume(10_000);
        assert_eq!(driver.poll(10_999), None);
        assert_eq!(driver.poll(11_000), Some(11_000));
    }

    #[test]
    fn disabled_driver_stays_quiet() {
        let mut driver = AutoTapDriver::new(1_000);
        driver.enable(0);
        driver.disable();
        driver.resume(0);
        assert_eq!(driver.poll(5_000), None);
        assert!(!driver.is_enabled());
        assert_eq!(driver.due_at(), None);
    }
}
