//! Combat resolution - damage computation, blocking, knockout detection

use crate::util::time::ticks_from_millis;
use crate::ws::protocol::{AttackKind, Side};

use super::fighter::Fighter;

/// Maximum horizontal distance at which any attack can connect
pub const ATTACK_RANGE: f32 = 150.0;

/// Fraction of damage that gets through a raised guard
pub const BLOCK_MITIGATION: f32 = 0.3;

/// Attack animation window (~200 ms)
pub const ATTACK_WINDOW_TICKS: u32 = ticks_from_millis(200);

/// Whole-body cooldown before another attack may be queued (~250 ms)
pub const ATTACK_COOLDOWN_TICKS: u32 = ticks_from_millis(250);

/// Meter cost of a special, and the gate below which it is refused
pub const SPECIAL_ENERGY_COST: f32 = 50.0;

/// Per-category tuning for the player's resolver path
#[derive(Debug, Clone, Copy)]
pub struct AttackProfile {
    pub base: f32,
    pub power_mult: f32,
    pub energy_cost: f32,
    /// Meter granted when the swing resolves
    pub energy_gain: f32,
}

impl AttackKind {
    pub fn profile(self) -> AttackProfile {
        match self {
            AttackKind::Light => AttackProfile {
                base: 8.0,
                power_mult: 0.10,
                energy_cost: 0.0,
                energy_gain: 5.0,
            },
            AttackKind::Heavy => AttackProfile {
                base: 15.0,
                power_mult: 0.20,
                energy_cost: 0.0,
                energy_gain: 10.0,
            },
            AttackKind::Kick => AttackProfile {
                base: 12.0,
                power_mult: 0.15,
                energy_cost: 0.0,
                energy_gain: 8.0,
            },
            AttackKind::Special => AttackProfile {
                base: 30.0,
                power_mult: 0.50,
                energy_cost: SPECIAL_ENERGY_COST,
                energy_gain: 0.0,
            },
        }
    }
}

/// Why an attack intent was dropped. Every rejection is a silent no-op:
/// no cooldown consumed, no meter spent, no state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackRejection {
    OnCooldown,
    MidSwing,
    OutOfRange,
    NotEnoughEnergy,
}

/// A resolved, landed attack
#[derive(Debug, Clone)]
pub struct HitResult {
    pub target: Side,
    pub kind: AttackKind,
    /// Final applied damage after any block mitigation
    pub amount: i32,
    pub blocked: bool,
    /// Defender position at impact
    pub target_position: f32,
    /// Defender health reached zero; the round ends immediately
    pub knockout: bool,
}

/// Combat resolver shared by the player and opponent paths
pub struct CombatResolver;

impl CombatResolver {
    pub fn in_range(attacker: &Fighter, defender: &Fighter) -> bool {
        attacker.distance_to(defender) <= ATTACK_RANGE
    }

    /// Player-path attack: damage scales with the character's power stat.
    /// Gate order: whole-body cooldown, animation window, range, meter.
    pub fn resolve_player_attack(
        attacker: &mut Fighter,
        defender: &mut Fighter,
        kind: AttackKind,
        power: u32,
        target: Side,
    ) -> Result<HitResult, AttackRejection> {
        if attacker.attack_locked {
            return Err(AttackRejection::OnCooldown);
        }
        if attacker.is_attacking {
            return Err(AttackRejection::MidSwing);
        }
        if !Self::in_range(attacker, defender) {
            return Err(AttackRejection::OutOfRange);
        }

        let profile = kind.profile();
        if attacker.energy < profile.energy_cost {
            return Err(AttackRejection::NotEnoughEnergy);
        }

        attacker.adjust_energy(profile.energy_gain - profile.energy_cost);
        let raw = profile.base + power as f32 * profile.power_mult;
        Ok(Self::apply(attacker, defender, kind, raw, target))
    }

    /// Opponent-path attack: fixed damage tiers chosen by the AI, no power
    /// scaling. The AI drops its guard to swing.
    pub fn resolve_opponent_attack(
        attacker: &mut Fighter,
        defender: &mut Fighter,
        kind: AttackKind,
        raw_damage: f32,
        energy_cost: f32,
        target: Side,
    ) -> Result<HitResult, AttackRejection> {
        if attacker.attack_locked {
            return Err(AttackRejection::OnCooldown);
        }
        if attacker.is_attacking {
            return Err(AttackRejection::MidSwing);
        }
        if !Self::in_range(attacker, defender) {
            return Err(AttackRejection::OutOfRange);
        }

        attacker.set_blocking(false);
        attacker.adjust_energy(-energy_cost);
        Ok(Self::apply(attacker, defender, kind, raw_damage, target))
    }

    /// Mitigation helper, exposed for direct verification
    pub fn mitigated(raw: f32) -> i32 {
        (raw * BLOCK_MITIGATION).round() as i32
    }

    fn apply(
        attacker: &mut Fighter,
        defender: &mut Fighter,
        kind: AttackKind,
        raw: f32,
        target: Side,
    ) -> HitResult {
        attacker.is_attacking = true;
        attacker.attack_locked = true;

        let blocked = defender.is_blocking;
        let amount = if blocked {
            Self::mitigated(raw)
        } else {
            raw.round() as i32
        };

        let target_position = defender.x;
        defender.take_damage(amount);

        HitResult {
            target,
            kind,
            amount,
            blocked,
            target_position,
            knockout: defender.is_down(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fighter::{OPPONENT_START_X, PLAYER_START_X};

    fn fighters_at(player_x: f32, opponent_x: f32) -> (Fighter, Fighter) {
        (Fighter::at_position(player_x), Fighter::at_position(opponent_x))
    }

    #[test]
    fn test_out_of_range_attack_is_dropped() {
        // Corners are 600 apart, well past the 150 range
        let (mut player, mut opponent) = fighters_at(PLAYER_START_X, OPPONENT_START_X);

        let result = CombatResolver::resolve_player_attack(
            &mut player,
            &mut opponent,
            AttackKind::Light,
            50,
            Side::Opponent,
        );

        assert_eq!(result.unwrap_err(), AttackRejection::OutOfRange);
        assert_eq!(opponent.health, 100);
        assert!(!player.attack_locked);
        assert!(!player.is_attacking);
        assert_eq!(player.energy, 0.0);
    }

    #[test]
    fn test_blocked_heavy_is_mitigated_exactly() {
        // Distance 50, opponent guarding, power 50:
        // 15 + 50*0.2 = 25 raw, round(25 * 0.3) = 8 applied
        let (mut player, mut opponent) = fighters_at(400.0, 450.0);
        opponent.set_blocking(true);

        let hit = CombatResolver::resolve_player_attack(
            &mut player,
            &mut opponent,
            AttackKind::Heavy,
            50,
            Side::Opponent,
        )
        .unwrap();

        assert!(hit.blocked);
        assert_eq!(hit.amount, 8);
        assert_eq!(opponent.health, 92);
    }

    #[test]
    fn test_special_requires_fifty_energy() {
        let (mut player, mut opponent) = fighters_at(400.0, 450.0);
        player.adjust_energy(49.0);

        let result = CombatResolver::resolve_player_attack(
            &mut player,
            &mut opponent,
            AttackKind::Special,
            40,
            Side::Opponent,
        );

        assert_eq!(result.unwrap_err(), AttackRejection::NotEnoughEnergy);
        assert!(!player.attack_locked);
        assert_eq!(player.energy, 49.0);
        assert_eq!(opponent.health, 100);
    }

    #[test]
    fn test_special_deducts_fifty_and_scales_with_power() {
        // Power 40: 30 + 40*0.5 = 50 unmitigated, meter 60 -> 10
        let (mut player, mut opponent) = fighters_at(400.0, 450.0);
        player.adjust_energy(60.0);

        let hit = CombatResolver::resolve_player_attack(
            &mut player,
            &mut opponent,
            AttackKind::Special,
            40,
            Side::Opponent,
        )
        .unwrap();

        assert_eq!(hit.amount, 50);
        assert_eq!(player.energy, 10.0);
        assert_eq!(opponent.health, 50);
    }

    #[test]
    fn test_cooldown_gates_followup_attacks() {
        let (mut player, mut opponent) = fighters_at(400.0, 450.0);

        CombatResolver::resolve_player_attack(
            &mut player,
            &mut opponent,
            AttackKind::Light,
            50,
            Side::Opponent,
        )
        .unwrap();

        let result = CombatResolver::resolve_player_attack(
            &mut player,
            &mut opponent,
            AttackKind::Light,
            50,
            Side::Opponent,
        );
        assert_eq!(result.unwrap_err(), AttackRejection::OnCooldown);
    }

    #[test]
    fn test_light_attack_grants_meter() {
        let (mut player, mut opponent) = fighters_at(400.0, 450.0);

        CombatResolver::resolve_player_attack(
            &mut player,
            &mut opponent,
            AttackKind::Light,
            50,
            Side::Opponent,
        )
        .unwrap();

        assert_eq!(player.energy, 5.0);
        // 8 + 50*0.1 = 13
        assert_eq!(opponent.health, 87);
        assert!(opponent.is_hit);
    }

    #[test]
    fn test_knockout_detected_at_zero() {
        let (mut player, mut opponent) = fighters_at(400.0, 450.0);
        opponent.health = 10;

        let hit = CombatResolver::resolve_player_attack(
            &mut player,
            &mut opponent,
            AttackKind::Heavy,
            50,
            Side::Opponent,
        )
        .unwrap();

        assert!(hit.knockout);
        assert_eq!(opponent.health, 0);
    }

    #[test]
    fn test_opponent_path_ignores_power_and_drops_guard() {
        let (mut player, mut opponent) = fighters_at(400.0, 450.0);
        opponent.set_blocking(true);

        let hit = CombatResolver::resolve_opponent_attack(
            &mut opponent,
            &mut player,
            AttackKind::Heavy,
            22.0,
            0.0,
            Side::Player,
        )
        .unwrap();

        assert_eq!(hit.amount, 22);
        assert!(!opponent.is_blocking);
        assert_eq!(player.health, 78);
    }
}
