//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60; // movement / AI / regen ticks per second
pub const SNAPSHOT_TPS: u32 = 20; // snapshots per second
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Round countdown cadence (one decrement per second)
pub const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);

/// Convert a real-time duration in milliseconds to whole simulation ticks
pub const fn ticks_from_millis(millis: u64) -> u32 {
    (millis * SIMULATION_TPS as u64 / 1000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_from_millis() {
        assert_eq!(ticks_from_millis(250), 15);
        assert_eq!(ticks_from_millis(200), 12);
        assert_eq!(ticks_from_millis(1200), 72);
    }
}
