// Tunable game rules.
//
// `GameRules` holds the numbers that decide how punishing a duel is: how much
// merge score converts into attacks, how many attacks one move may send, the
// odds of a 4 instead of a 2, and how long an idle player may sit on pending
// attacks before the server forces one onto their board. The server loads
// these from its JSON config; every field falls back to its default when
// omitted.
//
// The default attack policy is the scaled one: `min(4, gained / 128)` attacks,
// each a 2 or (10%) a 4. Setting `max_attacks_per_move = 1` and
// `attack_four_chance = 0.0` gives the flat "one 2 per big merge" tuning.

use serde::{Deserialize, Serialize};
use tile_duel_prng::TileRng;

use crate::board::Tile;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Merge score in one move that earns one attack.
    pub attack_threshold: u32,
    /// Cap on attacks a single move can send.
    pub max_attacks_per_move: u32,
    /// Probability that a generated attack tile is a 4.
    pub attack_four_chance: f64,
    /// Probability that a spawned tile is a 4.
    pub spawn_four_chance: f64,
    /// Idle read timeouts, with attacks pending, before one is forced.
    pub idle_ticks_before_attack: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            attack_threshold: 128,
            max_attacks_per_move: 4,
            attack_four_chance: 0.1,
            spawn_four_chance: 0.1,
            idle_ticks_before_attack: 5,
        }
    }
}

impl GameRules {
    /// Number of attacks earned by a move that gained `gained` points.
    pub fn attack_count(&self, gained: u32) -> u32 {
        if self.attack_threshold == 0 || gained < self.attack_threshold {
            return 0;
        }
        (gained / self.attack_threshold).min(self.max_attacks_per_move)
    }

    /// Roll the attack values a move that gained `gained` points sends to the
    /// opponent. Empty below the threshold.
    pub fn roll_attacks(&self, gained: u32, rng: &mut TileRng) -> Vec<Tile> {
        (0..self.attack_count(gained))
            .map(|_| {
                if rng.random_bool(self.attack_four_chance) {
                    4
                } else {
                    2
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_count_scales_and_caps() {
        let rules = GameRules::default();
        assert_eq!(rules.attack_count(0), 0);
        assert_eq!(rules.attack_count(127), 0);
        assert_eq!(rules.attack_count(128), 1);
        assert_eq!(rules.attack_count(300), 2);
        assert_eq!(rules.attack_count(512), 4);
        assert_eq!(rules.attack_count(4096), 4);
    }

    #[test]
    fn rolled_attacks_are_twos_or_fours() {
        let rules = GameRules::default();
        let mut rng = TileRng::new(9);
        for _ in 0..200 {
            let attacks = rules.roll_attacks(640, &mut rng);
            assert_eq!(attacks.len(), 4);
            assert!(attacks.iter().all(|v| *v == 2 || *v == 4));
        }
        assert!(rules.roll_attacks(100, &mut rng).is_empty());
    }

    #[test]
    fn flat_policy_is_expressible() {
        let rules = GameRules {
            max_attacks_per_move: 1,
            attack_four_chance: 0.0,
            ..GameRules::default()
        };
        let mut rng = TileRng::new(3);
        assert_eq!(rules.roll_attacks(1024, &mut rng), vec![2]);
    }

    #[test]
    fn zero_threshold_disables_attacks() {
        let rules = GameRules {
            attack_threshold: 0,
            ..GameRules::default()
        };
        assert_eq!(rules.attack_count(1_000_000), 0);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let rules: GameRules = serde_json::from_str(r#"{"attack_threshold": 64}"#).unwrap();
        assert_eq!(rules.attack_threshold, 64);
        assert_eq!(rules.max_attacks_per_move, 4);
        assert_eq!(rules.idle_ticks_before_attack, 5);
    }
}
