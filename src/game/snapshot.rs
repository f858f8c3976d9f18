//! Snapshot building for client sync

use crate::ws::protocol::{FighterSnapshot, ServerMsg};

use super::battle::BattleState;
use super::fighter::Fighter;

/// Decides when a snapshot is due for network transmission
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval,
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force a snapshot on the next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }
}

pub fn fighter_snapshot(fighter: &Fighter) -> FighterSnapshot {
    FighterSnapshot {
        health: fighter.health,
        energy: fighter.energy,
        position: fighter.x,
        is_blocking: fighter.is_blocking,
        is_attacking: fighter.is_attacking,
        is_hit: fighter.is_hit,
    }
}

/// Build a snapshot message, draining the events buffered since the last one
pub fn build_snapshot(state: &mut BattleState) -> ServerMsg {
    let events = state.take_events();
    ServerMsg::Snapshot {
        tick: state.tick,
        round: state.round,
        round_timer: state.round_timer,
        score: state.score,
        player: fighter_snapshot(&state.player),
        opponent: fighter_snapshot(&state.opponent),
        combo: state.combo.count(),
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence() {
        let mut builder = SnapshotBuilder::new(3);
        assert!(!builder.should_send());
        assert!(!builder.should_send());
        assert!(builder.should_send());
        assert!(!builder.should_send());
    }

    #[test]
    fn test_force_next() {
        let mut builder = SnapshotBuilder::new(3);
        builder.force_next();
        assert!(builder.should_send());
        assert!(!builder.should_send());
    }
}
