//! Combo tracking - consecutive landed hits inside a rolling window

use crate::util::time::ticks_from_millis;

/// Window after the last landed hit before the chain resets (~1200 ms)
pub const COMBO_WINDOW_TICKS: u32 = ticks_from_millis(1200);

/// Rolling hit counter. Purely observational: it feeds client feedback
/// and never influences damage or meter.
#[derive(Debug, Default)]
pub struct ComboTracker {
    count: u32,
    window_left: u32,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hit landed (either attacker): extend the chain and restart the
    /// window, superseding any pending reset
    pub fn on_hit(&mut self) {
        self.count += 1;
        self.window_left = COMBO_WINDOW_TICKS;
    }

    /// Advance the window by one tick; the chain resets when it elapses
    pub fn tick(&mut self) {
        if self.window_left > 0 {
            self.window_left -= 1;
            if self.window_left == 0 {
                self.count = 0;
            }
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_grows_within_window() {
        let mut combo = ComboTracker::new();
        combo.on_hit();
        for _ in 0..COMBO_WINDOW_TICKS / 2 {
            combo.tick();
        }
        combo.on_hit();
        assert_eq!(combo.count(), 2);
    }

    #[test]
    fn test_chain_resets_after_window_elapses() {
        let mut combo = ComboTracker::new();
        combo.on_hit();
        combo.on_hit();
        assert_eq!(combo.count(), 2);

        for _ in 0..COMBO_WINDOW_TICKS {
            combo.tick();
        }
        assert_eq!(combo.count(), 0);

        // The next landed hit starts a fresh chain
        combo.on_hit();
        assert_eq!(combo.count(), 1);
    }

    #[test]
    fn test_hit_restarts_pending_window() {
        let mut combo = ComboTracker::new();
        combo.on_hit();
        for _ in 0..COMBO_WINDOW_TICKS - 1 {
            combo.tick();
        }
        // One tick from expiry; a landed hit supersedes the pending reset
        combo.on_hit();
        for _ in 0..COMBO_WINDOW_TICKS - 1 {
            combo.tick();
        }
        assert_eq!(combo.count(), 2);
    }
}
