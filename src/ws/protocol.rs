//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roster::CharacterSheet;

/// Which corner a combatant fights from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Opponent,
}

/// Attack categories shared by both resolver paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    Light,
    Heavy,
    Kick,
    Special,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Assign the player's character and begin round 1
    StartMatch {
        /// Owned token whose stats drive the player's damage scaling
        token_id: u64,
    },

    /// Level-triggered held-key state, reported whenever it changes
    KeyState {
        left: bool,
        right: bool,
        block: bool,
    },

    /// Edge-triggered discrete action press
    Action { kind: AttackKind },

    /// Continue to the next round after a round ends
    NextRound,

    /// Rematch after the match has concluded
    Restart,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Leave the session
    Leave,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        session_id: Uuid,
        server_time: u64,
    },

    /// Both fighters assigned, round 1 underway
    MatchStarted {
        player: CharacterSheet,
        opponent: CharacterSheet,
        round: u32,
    },

    /// A new round is underway after a continue request
    RoundStarted { round: u32, round_timer: u32 },

    /// Game state snapshot (sent at regular intervals)
    Snapshot {
        /// Server tick number
        tick: u64,
        round: u32,
        /// Seconds left on the round clock
        round_timer: u32,
        score: MatchScore,
        player: FighterSnapshot,
        opponent: FighterSnapshot,
        /// Consecutive landed hits inside the combo window
        combo: u32,
        /// Events that occurred since the last snapshot
        events: Vec<GameEvent>,
    },

    /// Round concluded; waiting for a continue request unless the match ended
    RoundOver {
        winner: Side,
        score: MatchScore,
        knockout: bool,
    },

    /// Match concluded; terminal until an explicit restart
    MatchOver {
        won: bool,
        score: MatchScore,
        /// Player's updated persistent tally
        wins: u32,
        level: u32,
    },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Round-win tally for the current match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub player: u32,
    pub opponent: u32,
}

/// One fighter's state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FighterSnapshot {
    /// Health (0-100)
    pub health: i32,
    /// Special meter (0-100)
    pub energy: f32,
    /// Horizontal arena coordinate
    pub position: f32,
    pub is_blocking: bool,
    pub is_attacking: bool,
    pub is_hit: bool,
}

/// Discrete combat events for client feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// An attack landed
    Hit {
        target: Side,
        /// Defender position at impact, for floating damage feedback
        position: f32,
        amount: i32,
        kind: AttackKind,
        /// Special-tier styling flag
        special: bool,
    },

    /// A fighter's health reached zero
    Knockout { loser: Side },
}
