//! Basic attack resolution.
//!
//! An attack in range resolves to exactly one of missed, dodge, block or
//! damaged. Out of range the attacker walks towards its target instead. A
//! vanished target, or the attacker itself, makes the attack fizzle into an
//! idle outcome.

use super::{Resolution, RuleBook, Update, UpdateResult, World};
use crate::character::Character;
use crate::dice::{RollSource, roll_dice};
use crate::error::RuleError;
use crate::state::Action;
use crate::types::CharacterId;

/// Outcome of one blow that reached its target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Blow {
    Missed,
    Dodged,
    Blocked,
    Damaged(f64),
}

impl RuleBook {
    pub(super) fn attack(
        &self,
        attacker: &Character,
        action: Action,
        target: &CharacterId,
        world: World<'_>,
        rolls: &mut dyn RollSource,
    ) -> Result<Vec<Update>, RuleError> {
        let fizzle = || {
            vec![
                Update::new(attacker.id.clone(), action, UpdateResult::Idle)
                    .with_aggressor(attacker.id.clone()),
            ]
        };
        if *target == attacker.id {
            return Ok(fizzle());
        }
        let Some(defender) = world.characters.get(target) else {
            return Ok(fizzle());
        };
        let Some(target_position) = defender.position else {
            return Ok(fizzle());
        };
        let position = attacker
            .position
            .ok_or_else(|| RuleError::Unplaced(attacker.id.clone(), action))?;

        let gap = position.distance(target_position) - (attacker.radius + defender.radius);
        if gap > attacker.weapon_range() {
            return self
                .walk(attacker, action, Some(target_position), None, world)
                .map(|update| vec![update]);
        }

        let blow = match self.resolution {
            Resolution::Authoritative => self.strike(attacker, defender, rolls),
            Resolution::Predictive => Blow::Blocked,
        };
        let result = match blow {
            Blow::Missed => UpdateResult::Missed,
            Blow::Dodged => UpdateResult::Dodge,
            Blow::Blocked => UpdateResult::Block,
            Blow::Damaged(_) => UpdateResult::Damaged,
        };
        let mut update = Update::new(defender.id.clone(), action, result)
            .with_aggressor(attacker.id.clone())
            .with_duration(self.attack_duration(attacker));
        if let Blow::Damaged(damage) = blow {
            update = update.with_damage(damage, (defender.health() - damage).max(0.0));
        }
        Ok(vec![update])
    }

    /// Rolls hit, dodge, damage and armour for a blow in range.
    pub(super) fn strike(
        &self,
        attacker: &Character,
        defender: &Character,
        rolls: &mut dyn RollSource,
    ) -> Blow {
        let difficulty = attacker.weapon_difficulty().round().max(1.0) as u32;
        let hit = roll_dice(rolls, attacker.hit_pool(), difficulty).total;
        if hit < 1 {
            return Blow::Missed;
        }
        let dodge = roll_dice(rolls, defender.dodge_pool(), self.defence_difficulty).total;
        let margin = hit - dodge;
        if margin < 1 {
            return Blow::Dodged;
        }
        let extra = (margin - 1) as u32;
        let damage = roll_dice(rolls, attacker.damage_pool(extra), self.defence_difficulty).total;
        let armour = roll_dice(rolls, defender.armor_pool(), self.defence_difficulty).total;
        let effective = (damage - armour).max(0);
        if effective < 1 {
            return Blow::Blocked;
        }
        Blow::Damaged(f64::from(effective))
    }

    fn attack_duration(&self, attacker: &Character) -> u64 {
        let speed = attacker.attack_speed();
        if speed > 0.0 {
            (self.attack_duration_ms as f64 / speed).round() as u64
        } else {
            self.attack_duration_ms
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testing::registry;
    use super::*;
    use crate::character::testing::{axe_sheet, character_at};
    use crate::character::CharacterData;
    use crate::config::EngineConfig;
    use crate::dice::testing::{FixedRolls, ScriptedRolls};
    use crate::math::Vector;
    use crate::rules::WorldMap;

    fn rules(resolution: Resolution) -> RuleBook {
        RuleBook::new(resolution, &EngineConfig::default())
    }

    /// Defender with no dodge and no armour.
    fn dummy(x: f64, z: f64) -> Character {
        Character::new(
            CharacterData::new("dummy", json!({ "maxHealth": 20 }))
                .at(Vector::new(x, z))
                .with_radius(0.5),
        )
    }

    fn attack(
        rules: &RuleBook,
        characters: &std::collections::BTreeMap<CharacterId, Character>,
        rolls: &mut dyn RollSource,
    ) -> Vec<Update> {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let attacker = &characters[&CharacterId::new("axe")];
        rules
            .attack(
                attacker,
                Action::BasicAttack,
                &CharacterId::new("dummy"),
                World {
                    map: &map,
                    characters,
                },
                rolls,
            )
            .unwrap()
    }

    #[test]
    fn guaranteed_hit_damages() {
        let mut axe = character_at("axe", axe_sheet(), 10.0, 10.0);
        axe.radius = 0.5;
        let characters = registry([axe, dummy(11.0, 10.0)]);

        let updates = attack(&rules(Resolution::Authoritative), &characters, &mut FixedRolls::face(10));
        assert_eq!(updates.len(), 1);
        let update = &updates[0];
        assert_eq!(update.result, UpdateResult::Damaged);
        assert_eq!(update.character, CharacterId::new("dummy"));
        assert_eq!(update.aggressor, Some(CharacterId::new("axe")));
        // hit pool 4 all critical, no dodge: 3 extra dice on weapon damage 6.
        assert_eq!(update.damage, Some(9.0));
        assert_eq!(update.remaining_health, Some(11.0));
        assert_eq!(update.duration, 1000);
    }

    #[test]
    fn each_stage_can_stop_the_blow() {
        let rules = rules(Resolution::Authoritative);
        let axe = character_at("axe", axe_sheet(), 10.0, 10.0);
        let defender = character_at("dummy", axe_sheet(), 12.0, 10.0);

        // Four failing hit dice.
        let blow = rules.strike(&axe, &defender, &mut ScriptedRolls::new([2, 2, 2, 2], 2));
        assert_eq!(blow, Blow::Missed);

        // One hit against one dodge.
        let blow = rules.strike(&axe, &defender, &mut ScriptedRolls::new([6, 2, 2, 2, 8, 2, 2], 2));
        assert_eq!(blow, Blow::Dodged);

        // Hit lands, damage fully absorbed by armour.
        let blow = rules.strike(
            &axe,
            &defender,
            &mut ScriptedRolls::new([6, 6, 2, 2, 2, 2, 2, 7, 2, 2, 2, 2, 2, 2, 8, 8], 2),
        );
        assert_eq!(blow, Blow::Blocked);
    }

    #[test]
    fn missing_target_fizzles_to_idle() {
        let characters = registry([character_at("axe", axe_sheet(), 10.0, 10.0)]);

        let updates = attack(&rules(Resolution::Authoritative), &characters, &mut FixedRolls::face(10));
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].result, UpdateResult::Idle);
        assert_eq!(updates[0].character, CharacterId::new("axe"));
        assert_eq!(updates[0].duration, 0);
    }

    #[test]
    fn attacking_oneself_fizzles_to_idle() {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([character_at("axe", axe_sheet(), 10.0, 10.0)]);
        let axe = &characters[&CharacterId::new("axe")];

        let updates = rules(Resolution::Authoritative)
            .attack(
                axe,
                Action::BasicAttack,
                &axe.id,
                World {
                    map: &map,
                    characters: &characters,
                },
                &mut FixedRolls::face(10),
            )
            .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].result, UpdateResult::Idle);
        assert_eq!(updates[0].character, axe.id);
        assert_eq!(updates[0].damage, None);
    }

    #[test]
    fn out_of_range_walks_towards_target() {
        let characters = registry([
            character_at("axe", axe_sheet(), 10.0, 10.0),
            dummy(100.0, 10.0),
        ]);

        let updates = attack(&rules(Resolution::Authoritative), &characters, &mut FixedRolls::face(10));
        assert_eq!(updates[0].result, UpdateResult::Walk);
        assert_eq!(updates[0].character, CharacterId::new("axe"));
        assert_eq!(updates[0].action, Action::BasicAttack);
        assert!(updates[0].position.unwrap().x > 10.0);
    }

    #[test]
    fn prediction_never_damages() {
        let characters = registry([character_at("axe", axe_sheet(), 10.0, 10.0), dummy(11.0, 10.0)]);

        let updates = attack(&rules(Resolution::Predictive), &characters, &mut FixedRolls::face(10));
        assert_eq!(updates[0].result, UpdateResult::Block);
        assert_eq!(updates[0].damage, None);
    }

    #[test]
    fn outcomes_are_exhaustive_and_damage_positive() {
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;

        let rules = rules(Resolution::Authoritative);
        let characters = registry([
            character_at("axe", axe_sheet(), 10.0, 10.0),
            character_at("dummy", axe_sheet(), 12.0, 10.0),
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..500 {
            let update = attack(&rules, &characters, &mut rng).remove(0);
            match update.result {
                UpdateResult::Damaged => assert!(update.damage.unwrap() > 0.0),
                UpdateResult::Missed | UpdateResult::Dodge | UpdateResult::Block => {
                    assert_eq!(update.damage, None)
                }
                other => panic!("unexpected attack result {other}"),
            }
        }
    }
}
