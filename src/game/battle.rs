//! Round/match direction and the authoritative tick loop
//!
//! One battle session owns all simulation state for a single
//! player-vs-opponent match: both fighters, the round clock, the AI brain,
//! the combo tracker, and the list of tick-counted deferred effects.
//!
//! Per-tick order while a round is live: scheduled effects fire first,
//! then player movement and blocking, then the discrete action queue,
//! then the AI decision, then energy regen (which expires hit-reaction
//! flags), then the combo window. Attack resolution runs synchronously
//! inside the action and AI steps, never deferred to the next tick.

use dashmap::DashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::progression::ProgressionLedger;
use crate::roster::{self, CharacterSheet};
use crate::util::time::{COUNTDOWN_INTERVAL, SIMULATION_TPS, SNAPSHOT_TPS, TICK_DURATION_MICROS};
use crate::ws::protocol::{
    AttackKind, ClientMsg, GameEvent, MatchScore, ServerMsg, Side,
};

use super::ai::OpponentBrain;
use super::combat::{
    AttackRejection, CombatResolver, HitResult, ATTACK_COOLDOWN_TICKS, ATTACK_WINDOW_TICKS,
};
use super::combo::ComboTracker;
use super::fighter::{Fighter, MOVE_SPEED, OPPONENT_START_X, PLAYER_START_X};
use super::snapshot::{build_snapshot, SnapshotBuilder};
use super::{HeldKeys, PlayerInput};

/// Round clock, in seconds
pub const ROUND_SECONDS: u32 = 60;

/// Round wins needed to take the match (best of three)
pub const ROUNDS_TO_WIN: u32 = 2;

/// Discrete action requests held for the next tick; extras are dropped
const ACTION_QUEUE_LIMIT: usize = 8;

/// Battle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    /// Waiting for the player to pick a character
    Selecting,
    /// Round in progress
    Battling,
    /// Round concluded, waiting for a continue request
    RoundOver,
    /// Match concluded, terminal until an explicit restart
    MatchOver,
}

/// A deferred, tick-counted mutation owned by the director.
/// Effects read live state when they fire, never captured state.
#[derive(Debug, Clone, Copy)]
enum Effect {
    /// End of the attack animation window
    ClearAttackWindow(Side),
    /// Release of the whole-body attack cooldown
    ReleaseAttackGate(Side),
}

#[derive(Debug)]
struct PendingEffect {
    ticks_remaining: u32,
    effect: Effect,
}

/// Authoritative battle state (owned by the session task)
pub struct BattleState {
    pub id: Uuid,
    pub phase: BattlePhase,
    pub tick: u64,
    pub round: u32,
    pub round_timer: u32,
    pub score: MatchScore,
    pub player: Fighter,
    pub opponent: Fighter,
    pub player_sheet: Option<CharacterSheet>,
    pub opponent_sheet: Option<CharacterSheet>,
    pub held: HeldKeys,
    pub combo: ComboTracker,
    action_queue: VecDeque<AttackKind>,
    pending: Vec<PendingEffect>,
    brain: OpponentBrain,
    events: Vec<GameEvent>,
    outbox: Vec<ServerMsg>,
    rng: ChaCha8Rng,
    ledger: Arc<ProgressionLedger>,
}

impl BattleState {
    pub fn new(id: Uuid, seed: u64, ledger: Arc<ProgressionLedger>) -> Self {
        Self {
            id,
            phase: BattlePhase::Selecting,
            tick: 0,
            round: 1,
            round_timer: ROUND_SECONDS,
            score: MatchScore::default(),
            player: Fighter::at_position(PLAYER_START_X),
            opponent: Fighter::at_position(OPPONENT_START_X),
            player_sheet: None,
            opponent_sheet: None,
            held: HeldKeys::default(),
            combo: ComboTracker::new(),
            action_queue: VecDeque::new(),
            pending: Vec::new(),
            brain: OpponentBrain::new(),
            events: Vec::new(),
            outbox: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            ledger,
        }
    }

    /// Handle one client message. Replies and notifications land in the
    /// outbox for the session to flush.
    pub fn handle_msg(&mut self, msg: ClientMsg) {
        match msg {
            ClientMsg::StartMatch { token_id } => self.start_match(token_id),
            ClientMsg::KeyState { left, right, block } => {
                self.held = HeldKeys { left, right, block };
            }
            ClientMsg::Action { kind } => {
                if self.phase == BattlePhase::Battling
                    && self.action_queue.len() < ACTION_QUEUE_LIMIT
                {
                    self.action_queue.push_back(kind);
                }
            }
            ClientMsg::NextRound => self.next_round(),
            ClientMsg::Restart => self.restart(),
            ClientMsg::Ping { t } => self.outbox.push(ServerMsg::Pong { t }),
            ClientMsg::Leave => {
                // Session teardown is handled by the session loop
            }
        }
    }

    fn start_match(&mut self, token_id: u64) {
        if self.phase != BattlePhase::Selecting {
            self.outbox.push(ServerMsg::Error {
                code: "match_in_progress".to_string(),
                message: "A match is already underway".to_string(),
            });
            return;
        }

        let record = self.ledger.get(token_id);
        let mut player_sheet = roster::sheet_for_token(token_id);
        player_sheet.wins = record.wins;
        player_sheet.level = record.level();

        let opponent_sheet = roster::generate_opponent(&mut self.rng);

        info!(
            session_id = %self.id,
            token_id,
            opponent = %opponent_sheet.name,
            "Match starting"
        );

        self.player_sheet = Some(player_sheet.clone());
        self.opponent_sheet = Some(opponent_sheet.clone());
        self.score = MatchScore::default();
        self.begin_round(1);
        self.phase = BattlePhase::Battling;

        self.outbox.push(ServerMsg::MatchStarted {
            player: player_sheet,
            opponent: opponent_sheet,
            round: self.round,
        });
    }

    /// Reset per-round state and the fighters to their corners
    fn begin_round(&mut self, round: u32) {
        self.round = round;
        self.round_timer = ROUND_SECONDS;
        self.player.reset(PLAYER_START_X);
        self.opponent.reset(OPPONENT_START_X);
        self.brain.reset();
        self.combo.reset();
        self.pending.clear();
        self.action_queue.clear();
        self.events.clear();
    }

    fn next_round(&mut self) {
        if self.phase != BattlePhase::RoundOver {
            debug!(session_id = %self.id, "Continue request outside round break ignored");
            return;
        }
        self.begin_round(self.round + 1);
        self.phase = BattlePhase::Battling;
        self.outbox.push(ServerMsg::RoundStarted {
            round: self.round,
            round_timer: self.round_timer,
        });
    }

    fn restart(&mut self) {
        if self.phase != BattlePhase::MatchOver {
            self.outbox.push(ServerMsg::Error {
                code: "match_not_over".to_string(),
                message: "Rematch is only available after the match ends".to_string(),
            });
            return;
        }

        self.score = MatchScore::default();
        self.held = HeldKeys::default();
        self.begin_round(1);
        self.phase = BattlePhase::Battling;

        if let (Some(player), Some(opponent)) =
            (self.player_sheet.clone(), self.opponent_sheet.clone())
        {
            self.outbox.push(ServerMsg::MatchStarted {
                player,
                opponent,
                round: self.round,
            });
        }
    }

    /// Advance the high-frequency simulation by one tick
    pub fn sim_tick(&mut self) {
        self.tick += 1;
        if self.phase != BattlePhase::Battling {
            self.action_queue.clear();
            return;
        }

        self.advance_pending_effects();
        self.apply_player_movement();
        self.consume_player_actions();
        if self.phase != BattlePhase::Battling {
            return;
        }
        self.run_ai();
        if self.phase != BattlePhase::Battling {
            return;
        }
        self.player.tick_regen();
        self.opponent.tick_regen();
        self.combo.tick();
    }

    /// Advance the low-frequency round clock by one second
    pub fn countdown_tick(&mut self) {
        if self.phase != BattlePhase::Battling {
            return;
        }
        self.round_timer = self.round_timer.saturating_sub(1);
        if self.round_timer == 0 {
            // Timeout: higher health takes the round; an exact tie goes
            // to the opponent
            let winner = if self.player.health > self.opponent.health {
                Side::Player
            } else {
                Side::Opponent
            };
            self.end_round(winner, false);
        }
    }

    fn advance_pending_effects(&mut self) {
        let mut fired = Vec::new();
        for entry in self.pending.iter_mut() {
            entry.ticks_remaining -= 1;
            if entry.ticks_remaining == 0 {
                fired.push(entry.effect);
            }
        }
        self.pending.retain(|entry| entry.ticks_remaining > 0);

        for effect in fired {
            match effect {
                Effect::ClearAttackWindow(side) => self.fighter_mut(side).is_attacking = false,
                Effect::ReleaseAttackGate(side) => self.fighter_mut(side).attack_locked = false,
            }
        }
    }

    fn apply_player_movement(&mut self) {
        if self.held.left {
            self.player.apply_movement(-MOVE_SPEED);
        }
        if self.held.right {
            self.player.apply_movement(MOVE_SPEED);
        }
        self.player.set_blocking(self.held.block);
    }

    fn consume_player_actions(&mut self) {
        let power = match &self.player_sheet {
            Some(sheet) => sheet.power,
            None => return,
        };

        while let Some(kind) = self.action_queue.pop_front() {
            match CombatResolver::resolve_player_attack(
                &mut self.player,
                &mut self.opponent,
                kind,
                power,
                Side::Opponent,
            ) {
                Ok(hit) => {
                    self.register_hit(Side::Player, hit);
                    if self.phase != BattlePhase::Battling {
                        self.action_queue.clear();
                        return;
                    }
                }
                Err(rejection) => self.log_rejection(Side::Player, kind, rejection),
            }
        }
    }

    fn run_ai(&mut self) {
        let order = self
            .brain
            .decide(&mut self.opponent, &self.player, &mut self.rng);

        if let Some(order) = order {
            match CombatResolver::resolve_opponent_attack(
                &mut self.opponent,
                &mut self.player,
                order.kind,
                order.raw_damage,
                order.energy_cost,
                Side::Player,
            ) {
                Ok(hit) => self.register_hit(Side::Opponent, hit),
                Err(rejection) => self.log_rejection(Side::Opponent, order.kind, rejection),
            }
        }
    }

    fn register_hit(&mut self, attacker: Side, hit: HitResult) {
        self.combo.on_hit();
        self.schedule(ATTACK_WINDOW_TICKS, Effect::ClearAttackWindow(attacker));
        self.schedule(ATTACK_COOLDOWN_TICKS, Effect::ReleaseAttackGate(attacker));

        self.events.push(GameEvent::Hit {
            target: hit.target,
            position: hit.target_position,
            amount: hit.amount,
            kind: hit.kind,
            special: hit.kind == AttackKind::Special,
        });

        if hit.knockout {
            self.events.push(GameEvent::Knockout { loser: hit.target });
            self.end_round(attacker, true);
        }
    }

    fn end_round(&mut self, winner: Side, knockout: bool) {
        match winner {
            Side::Player => self.score.player += 1,
            Side::Opponent => self.score.opponent += 1,
        }
        self.phase = BattlePhase::RoundOver;

        info!(
            session_id = %self.id,
            round = self.round,
            winner = ?winner,
            knockout,
            "Round over"
        );

        // Flush a final snapshot so the closing hit and knockout reach
        // the client before the round banner
        let snapshot = build_snapshot(self);
        self.outbox.push(snapshot);
        self.outbox.push(ServerMsg::RoundOver {
            winner,
            score: self.score,
            knockout,
        });

        if self.score.player >= ROUNDS_TO_WIN || self.score.opponent >= ROUNDS_TO_WIN {
            let won = self.score.player >= ROUNDS_TO_WIN;
            self.phase = BattlePhase::MatchOver;

            let (wins, level) = self.report_outcome(won);
            info!(session_id = %self.id, won, "Match over");

            self.outbox.push(ServerMsg::MatchOver {
                won,
                score: self.score,
                wins,
                level,
            });
        }
    }

    /// Report the concluded match to the progression collaborator.
    /// Reached exactly once per match: the phase turns terminal in the
    /// same breath and only an explicit restart re-arms it.
    fn report_outcome(&mut self, won: bool) -> (u32, u32) {
        match &self.player_sheet {
            Some(sheet) => {
                let record = self.ledger.record_result(sheet.token_id, won);
                (record.wins, record.level())
            }
            None => (0, 1),
        }
    }

    fn schedule(&mut self, ticks: u32, effect: Effect) {
        self.pending.push(PendingEffect {
            ticks_remaining: ticks,
            effect,
        });
    }

    fn fighter_mut(&mut self, side: Side) -> &mut Fighter {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.opponent,
        }
    }

    fn log_rejection(&self, side: Side, kind: AttackKind, rejection: AttackRejection) {
        debug!(
            session_id = %self.id,
            side = ?side,
            kind = ?kind,
            rejection = ?rejection,
            "Attack intent dropped"
        );
    }

    /// Drain events buffered since the last snapshot
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain queued outbound messages
    pub fn take_outbox(&mut self) -> Vec<ServerMsg> {
        std::mem::take(&mut self.outbox)
    }
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub input_tx: mpsc::Sender<PlayerInput>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
}

/// Registry of all active battle sessions
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    pub fn insert(&self, handle: SessionHandle) {
        self.sessions.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, h)| h)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative battle session task
pub struct BattleSession {
    state: BattleState,
    input_rx: mpsc::Receiver<PlayerInput>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
}

impl BattleSession {
    /// Create a new session and its handle
    pub fn new(id: Uuid, seed: u64, ledger: Arc<ProgressionLedger>) -> (Self, SessionHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);

        let handle = SessionHandle {
            id,
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
        };

        let snapshot_interval = SIMULATION_TPS / SNAPSHOT_TPS;
        let session = Self {
            state: BattleState::new(id, seed, ledger),
            input_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval),
        };

        (session, handle)
    }

    /// Run the authoritative tick loop. Two schedulers share the session
    /// state: the 60 Hz simulation tick and the 1 Hz round countdown.
    /// All mutation is synchronous inside this task.
    pub async fn run(mut self) {
        info!(session_id = %self.state.id, "Battle session started");

        let tick_duration = Duration::from_micros(TICK_DURATION_MICROS);
        let mut sim_interval = interval(tick_duration);
        sim_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut countdown_interval =
            interval_at(Instant::now() + COUNTDOWN_INTERVAL, COUNTDOWN_INTERVAL);
        countdown_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = sim_interval.tick() => {
                    self.state.sim_tick();
                    if self.state.phase == BattlePhase::Battling
                        && self.snapshot_builder.should_send()
                    {
                        let snapshot = build_snapshot(&mut self.state);
                        let _ = self.snapshot_tx.send(snapshot);
                    }
                    self.flush_outbox();
                }
                _ = countdown_interval.tick() => {
                    self.state.countdown_tick();
                    self.flush_outbox();
                }
                input = self.input_rx.recv() => {
                    match input {
                        None => break,
                        Some(PlayerInput { msg: ClientMsg::Leave, .. }) => {
                            info!(session_id = %self.state.id, "Client left session");
                            break;
                        }
                        Some(input) => {
                            self.state.handle_msg(input.msg);
                            self.flush_outbox();
                        }
                    }
                }
            }
        }

        info!(session_id = %self.state.id, "Battle session closed");
    }

    fn flush_outbox(&mut self) {
        for msg in self.state.take_outbox() {
            let _ = self.snapshot_tx.send(msg);
        }
    }
}
