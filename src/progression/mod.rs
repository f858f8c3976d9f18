//! Character progression ledger
//!
//! Receives exactly one `{ won }` report per concluded match and keeps the
//! per-token win tally for the lifetime of the process. Level is derived,
//! never stored.

use dashmap::DashMap;
use serde::Serialize;
use tracing::info;

/// Level curve: one level per three wins
pub fn level_for_wins(wins: u32) -> u32 {
    wins / 3 + 1
}

/// Win/loss tally for one token
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ProgressRecord {
    pub wins: u32,
    pub losses: u32,
}

impl ProgressRecord {
    pub fn level(&self) -> u32 {
        level_for_wins(self.wins)
    }
}

/// In-memory progression store, shared across sessions
#[derive(Default)]
pub struct ProgressionLedger {
    records: DashMap<u64, ProgressRecord>,
}

impl ProgressionLedger {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Record a concluded match for a token, returning the updated tally
    pub fn record_result(&self, token_id: u64, won: bool) -> ProgressRecord {
        let mut entry = self.records.entry(token_id).or_default();
        if won {
            entry.wins += 1;
        } else {
            entry.losses += 1;
        }
        let record = *entry;
        drop(entry);

        info!(
            token_id,
            won,
            wins = record.wins,
            level = record.level(),
            "Match result recorded"
        );
        record
    }

    /// Current tally for a token (zeroed if it has never fought)
    pub fn get(&self, token_id: u64) -> ProgressRecord {
        self.records
            .get(&token_id)
            .map(|r| *r)
            .unwrap_or_default()
    }

    pub fn tracked_tokens(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_curve() {
        assert_eq!(level_for_wins(0), 1);
        assert_eq!(level_for_wins(2), 1);
        assert_eq!(level_for_wins(3), 2);
        assert_eq!(level_for_wins(8), 3);
        assert_eq!(level_for_wins(9), 4);
    }

    #[test]
    fn test_record_result_tallies() {
        let ledger = ProgressionLedger::new();
        ledger.record_result(1, true);
        ledger.record_result(1, true);
        ledger.record_result(1, false);
        let record = ledger.get(1);
        assert_eq!(record.wins, 2);
        assert_eq!(record.losses, 1);
        assert_eq!(record.level(), 1);

        ledger.record_result(1, true);
        assert_eq!(ledger.get(1).level(), 2);
    }

    #[test]
    fn test_unknown_token_is_fresh() {
        let ledger = ProgressionLedger::new();
        let record = ledger.get(999);
        assert_eq!(record.wins, 0);
        assert_eq!(record.losses, 0);
        assert_eq!(record.level(), 1);
    }
}
