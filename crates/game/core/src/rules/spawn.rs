//! Spawn placement inside the map's spawn disks.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use super::{Resolution, RuleBook, SpawnLocation, Update, UpdateResult, World};
use crate::character::{Character, default_orientation, facing_or_default};
use crate::dice::RollSource;
use crate::error::RuleError;
use crate::math::Vector;
use crate::state::Action;
use crate::types::CharacterId;

impl RuleBook {
    /// Places `character` in the first free spot found.
    ///
    /// A character that already stands somewhere is confirmed in place.
    /// Locations are tried preferred-origin first, each with a bounded number
    /// of uniform samples; running out is reported, never retried here.
    pub(super) fn spawn(
        &self,
        character: &Character,
        origin: Option<&str>,
        world: World<'_>,
        rolls: &mut dyn RollSource,
    ) -> Result<Vec<Update>, RuleError> {
        if self.resolution == Resolution::Predictive {
            return Ok(Vec::new());
        }
        if let Some(position) = character.position {
            let orientation = facing_or_default(character.orientation, position);
            return Ok(vec![self.spawned(character, position, orientation)]);
        }

        let candidates = world.map.spawn_candidates(origin);
        if candidates.is_empty() {
            return Err(RuleError::NoSpawnLocations(character.id.clone()));
        }
        for location in candidates {
            for _ in 0..self.spawn_attempts {
                let position = sample_disk(location, rolls);
                if is_free(character, position, world.characters) {
                    return Ok(vec![self.spawned(
                        character,
                        position,
                        default_orientation(position),
                    )]);
                }
            }
        }
        Err(RuleError::SpawnExhausted {
            character: character.id.clone(),
            attempts: self.spawn_attempts,
        })
    }

    fn spawned(&self, character: &Character, position: Vector, orientation: Vector) -> Update {
        Update::new(character.id.clone(), Action::Spawn, UpdateResult::Spawn)
            .at(position, orientation)
            .with_remaining_health(character.health())
            .with_sheet(character.sheet.clone())
    }
}

/// Uniform sample over the location's disk.
fn sample_disk(location: &SpawnLocation, rolls: &mut dyn RollSource) -> Vector {
    let distance = location.radius * rolls.unit().sqrt();
    let angle = TAU * rolls.unit();
    location.position + Vector::new(distance * angle.cos(), distance * angle.sin())
}

fn is_free(
    character: &Character,
    position: Vector,
    characters: &BTreeMap<CharacterId, Character>,
) -> bool {
    characters
        .values()
        .filter(|other| other.id != character.id)
        .all(|other| {
            other
                .position
                .is_none_or(|at| at.distance(position) >= character.radius + other.radius)
        })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    use super::super::testing::registry;
    use super::*;
    use crate::character::CharacterData;
    use crate::config::EngineConfig;
    use crate::rules::WorldMap;

    fn newcomer() -> Character {
        Character::new(CharacterData::new("new", json!({ "maxHealth": 5 })).with_radius(1.0))
    }

    fn boulder(x: f64, z: f64, radius: f64) -> Character {
        Character::new(
            CharacterData::new("boulder", json!({ "maxHealth": 1 }))
                .at(Vector::new(x, z))
                .with_radius(radius),
        )
    }

    #[test]
    fn places_inside_a_free_location() {
        let rules = RuleBook::new(Resolution::Authoritative, &EngineConfig::default());
        let map = WorldMap::new(Vector::new(400.0, 400.0))
            .with_spawn_location(SpawnLocation::new(Vector::new(50.0, 50.0), 10.0));
        let characters = registry([newcomer()]);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let updates = rules
            .spawn(
                &characters[&CharacterId::new("new")],
                None,
                World {
                    map: &map,
                    characters: &characters,
                },
                &mut rng,
            )
            .unwrap();
        assert_eq!(updates.len(), 1);
        let position = updates[0].position.unwrap();
        assert!(position.distance(Vector::new(50.0, 50.0)) <= 10.0);
        assert_eq!(updates[0].result, UpdateResult::Spawn);
        assert!(updates[0].sheet.is_some());
    }

    #[test]
    fn skips_to_next_location_when_blocked() {
        let rules = RuleBook::new(Resolution::Authoritative, &EngineConfig::default());
        let map = WorldMap::new(Vector::new(400.0, 400.0))
            .with_spawn_location(SpawnLocation::new(Vector::new(50.0, 50.0), 5.0).with_origin("home"))
            .with_spawn_location(SpawnLocation::new(Vector::new(200.0, 200.0), 5.0));
        let characters = registry([newcomer(), boulder(50.0, 50.0, 20.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let updates = rules
            .spawn(
                &characters[&CharacterId::new("new")],
                Some("home"),
                World {
                    map: &map,
                    characters: &characters,
                },
                &mut rng,
            )
            .unwrap();
        let position = updates[0].position.unwrap();
        assert!(position.distance(Vector::new(200.0, 200.0)) <= 5.0);
    }

    #[test]
    fn fully_occupied_map_is_exhausted() {
        let rules = RuleBook::new(Resolution::Authoritative, &EngineConfig::default());
        let map = WorldMap::new(Vector::new(400.0, 400.0))
            .with_spawn_location(SpawnLocation::new(Vector::new(50.0, 50.0), 5.0));
        let characters = registry([newcomer(), boulder(50.0, 50.0, 20.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let err = rules
            .spawn(
                &characters[&CharacterId::new("new")],
                None,
                World {
                    map: &map,
                    characters: &characters,
                },
                &mut rng,
            )
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::SpawnExhausted {
                character: CharacterId::new("new"),
                attempts: EngineConfig::DEFAULT_SPAWN_ATTEMPTS,
            }
        );
    }

    #[test]
    fn placed_character_is_confirmed_in_place() {
        let rules = RuleBook::new(Resolution::Authoritative, &EngineConfig::default());
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([boulder(3.0, 4.0, 1.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let updates = rules
            .spawn(
                &characters[&CharacterId::new("boulder")],
                None,
                World {
                    map: &map,
                    characters: &characters,
                },
                &mut rng,
            )
            .unwrap();
        assert_eq!(updates[0].position, Some(Vector::new(3.0, 4.0)));
    }

    #[test]
    fn prediction_leaves_spawning_to_the_server() {
        let rules = RuleBook::new(Resolution::Predictive, &EngineConfig::default());
        let map = WorldMap::new(Vector::new(400.0, 400.0))
            .with_spawn_location(SpawnLocation::new(Vector::new(50.0, 50.0), 10.0));
        let characters = registry([newcomer()]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let updates = rules
            .spawn(
                &characters[&CharacterId::new("new")],
                None,
                World {
                    map: &map,
                    characters: &characters,
                },
                &mut rng,
            )
            .unwrap();
        assert!(updates.is_empty());
    }
}
