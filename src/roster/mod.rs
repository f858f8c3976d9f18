//! Character roster - read-only stat sourcing for fighters
//!
//! Token ids map deterministically to an element, a class, and a species
//! stat line. The simulation core only reads `power` (the duel mode also
//! reads `defense`); it never writes back into a sheet.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::progression::level_for_wins;

/// Elemental affinity, derived from the token id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Water,
    Wind,
    Earth,
}

impl Element {
    pub fn for_token(token_id: u64) -> Self {
        match token_id % 4 {
            0 => Self::Fire,
            1 => Self::Water,
            2 => Self::Wind,
            _ => Self::Earth,
        }
    }
}

/// Fighter class, derived from the token id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FighterClass {
    Warrior,
    Mage,
    Assassin,
    Tank,
    Ranger,
}

impl FighterClass {
    pub fn for_token(token_id: u64) -> Self {
        match token_id % 5 {
            0 => Self::Warrior,
            1 => Self::Mage,
            2 => Self::Assassin,
            3 => Self::Tank,
            _ => Self::Ranger,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Warrior => "Warrior",
            Self::Mage => "Mage",
            Self::Assassin => "Assassin",
            Self::Tank => "Tank",
            Self::Ranger => "Ranger",
        }
    }
}

/// (power, defense) species lines per element
const FIRE_STATS: &[(u32, u32)] = &[
    (52, 43),
    (64, 58),
    (84, 78),
    (76, 75),
    (110, 80),
    (100, 70),
    (95, 57),
    (130, 60),
];

const WATER_STATS: &[(u32, u32)] = &[
    (48, 65),
    (63, 80),
    (83, 100),
    (82, 78),
    (95, 95),
    (125, 79),
    (85, 80),
    (110, 95),
];

const WIND_STATS: &[(u32, u32)] = &[
    (45, 40),
    (60, 55),
    (80, 75),
    (90, 65),
    (90, 55),
    (83, 57),
    (110, 65),
    (90, 85),
];

const EARTH_STATS: &[(u32, u32)] = &[
    (75, 85),
    (100, 110),
    (92, 87),
    (102, 77),
    (100, 60),
    (120, 130),
    (85, 95),
    (130, 120),
];

fn stat_line(element: Element, token_id: u64) -> (u32, u32) {
    let table = match element {
        Element::Fire => FIRE_STATS,
        Element::Water => WATER_STATS,
        Element::Wind => WIND_STATS,
        Element::Earth => EARTH_STATS,
    };
    table[(token_id % table.len() as u64) as usize]
}

/// One combatant's immutable character record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub token_id: u64,
    pub name: String,
    pub class: FighterClass,
    pub element: Element,
    pub power: u32,
    pub defense: u32,
    pub wins: u32,
    pub level: u32,
}

/// Build the sheet for an owned token
pub fn sheet_for_token(token_id: u64) -> CharacterSheet {
    let element = Element::for_token(token_id);
    let class = FighterClass::for_token(token_id);
    let (power, defense) = stat_line(element, token_id);

    CharacterSheet {
        token_id,
        name: format!("{} #{}", class.label(), token_id),
        class,
        element,
        power,
        defense,
        wins: 0,
        level: 1,
    }
}

/// Generate an AI-controlled opponent with a random token identity
pub fn generate_opponent<R: Rng>(rng: &mut R) -> CharacterSheet {
    let token_id = rng.gen_range(0..1000u64);
    let wins = rng.gen_range(0..15u32);
    let element = Element::for_token(token_id);
    let class = FighterClass::for_token(token_id);
    let (power, defense) = stat_line(element, token_id);

    CharacterSheet {
        token_id,
        name: format!("AI {} #{}", class.label(), token_id),
        class,
        element,
        power,
        defense,
        wins,
        level: level_for_wins(wins),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_token_mapping_is_deterministic() {
        let a = sheet_for_token(42);
        let b = sheet_for_token(42);
        assert_eq!(a.power, b.power);
        assert_eq!(a.defense, b.defense);
        assert_eq!(a.element, b.element);
        assert_eq!(a.class, b.class);
    }

    #[test]
    fn test_element_cycles_every_four_tokens() {
        assert_eq!(Element::for_token(0), Element::Fire);
        assert_eq!(Element::for_token(1), Element::Water);
        assert_eq!(Element::for_token(2), Element::Wind);
        assert_eq!(Element::for_token(3), Element::Earth);
        assert_eq!(Element::for_token(4), Element::Fire);
    }

    #[test]
    fn test_generated_opponent_level_matches_wins() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let opp = generate_opponent(&mut rng);
            assert!(opp.token_id < 1000);
            assert!(opp.wins < 15);
            assert_eq!(opp.level, opp.wins / 3 + 1);
        }
    }
}
