//! Walking: one bounded step with swept collision.
//!
//! A step is checked in priority order: exits, then characters, then the map
//! boundary. An exit only wins if no character blocks the path before it.

use std::collections::BTreeMap;

use super::{Exit, RuleBook, Update, UpdateResult, World};
use crate::character::{Character, facing_or_default};
use crate::error::RuleError;
use crate::math::{Vector, segment_circle_entry};
use crate::state::Action;
use crate::types::CharacterId;

/// First point along a step where the mover touches something.
#[derive(Debug)]
struct Contact<T> {
    /// Fraction of the step travelled before touching.
    t: f64,
    position: Vector,
    with: T,
}

impl RuleBook {
    pub(super) fn walk(
        &self,
        mover: &Character,
        action: Action,
        destination: Option<Vector>,
        orientation: Option<Vector>,
        world: World<'_>,
    ) -> Result<Update, RuleError> {
        let from = mover
            .position
            .ok_or_else(|| RuleError::Unplaced(mover.id.clone(), action))?;
        let speed = mover.move_speed();
        let heading = facing_or_default(orientation.or(mover.orientation), from);
        let target = destination.unwrap_or_else(|| from + heading * speed);
        let to = from.step_towards(target, speed);
        let facing = if to == from {
            heading
        } else {
            from.direction_to(to)
        };

        let step = |result: UpdateResult, position: Vector| {
            Update::new(mover.id.clone(), action, result)
                .at(position, facing)
                .with_speed(speed)
                .with_duration(self.walk_duration_ms)
        };

        let blocker = first_character_contact(mover, from, to, world.characters);
        let exit = first_exit_contact(mover, from, to, &world.map.exits);

        if let Some(exit) = exit
            && blocker.as_ref().is_none_or(|blocker| exit.t <= blocker.t)
        {
            return Ok(step(UpdateResult::Warp, exit.position).with_destination(&exit.with.destination));
        }
        if let Some(blocker) = blocker {
            return Ok(step(UpdateResult::Collision, blocker.position).with_collider(blocker.with.clone()));
        }
        if !world.map.contains(to) {
            return Ok(step(UpdateResult::Collision, world.map.clamp(to)));
        }
        Ok(step(UpdateResult::Walk, to))
    }
}

/// Nearest character the mover runs into while travelling `from → to`.
///
/// Only characters in front of the mover count: an overlap with something
/// behind it does not stop it from walking away.
fn first_character_contact(
    mover: &Character,
    from: Vector,
    to: Vector,
    characters: &BTreeMap<CharacterId, Character>,
) -> Option<Contact<CharacterId>> {
    let travel = to - from;
    let mut nearest: Option<Contact<CharacterId>> = None;
    for other in characters.values() {
        if !mover.collides_with(other) {
            continue;
        }
        let Some(center) = other.position else {
            continue;
        };
        let Some(t) = segment_circle_entry(from, to, center, mover.radius + other.radius) else {
            continue;
        };
        if (center - from).dot(travel) <= 0.0 {
            continue;
        }
        if nearest.as_ref().is_none_or(|nearest| t < nearest.t) {
            nearest = Some(Contact {
                t,
                position: from + travel * t,
                with: other.id.clone(),
            });
        }
    }
    nearest
}

fn first_exit_contact<'a>(
    mover: &Character,
    from: Vector,
    to: Vector,
    exits: &'a [Exit],
) -> Option<Contact<&'a Exit>> {
    exits
        .iter()
        .filter_map(|exit| {
            let t = segment_circle_entry(from, to, exit.position, mover.radius + exit.radius)?;
            Some(Contact {
                t,
                position: from + (to - from) * t,
                with: exit,
            })
        })
        .min_by(|a, b| a.t.total_cmp(&b.t))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testing::registry;
    use super::*;
    use crate::character::CharacterData;
    use crate::config::EngineConfig;
    use crate::rules::{Resolution, WorldMap};

    const EPS: f64 = 1e-9;

    /// Radius-1 character whose move speed is `10 + 3 * dexterity`.
    fn runner(id: &str, dexterity: u32, x: f64, z: f64) -> Character {
        Character::new(
            CharacterData::new(
                id,
                json!({
                    "maxHealth": 10,
                    "attributes": { "physical": { "dexterity": dexterity } }
                }),
            )
            .at(Vector::new(x, z))
            .with_radius(1.0),
        )
    }

    fn rules() -> RuleBook {
        RuleBook::new(Resolution::Authoritative, &EngineConfig::default())
    }

    fn walk_once(map: &WorldMap, characters: &BTreeMap<CharacterId, Character>, id: &str, destination: Vector) -> Update {
        let mover = &characters[&CharacterId::new(id)];
        rules()
            .walk(
                mover,
                Action::Walk,
                Some(destination),
                None,
                World { map, characters },
            )
            .unwrap()
    }

    #[test]
    fn step_is_clamped_to_move_speed() {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([runner("w", 0, 10.0, 10.0)]);

        let update = walk_once(&map, &characters, "w", Vector::new(110.0, 10.0));
        assert_eq!(update.result, UpdateResult::Walk);
        assert!(update.position.unwrap().approx_eq(Vector::new(20.0, 10.0), EPS));
        assert_eq!(update.speed, Some(10.0));
        assert_eq!(update.duration, EngineConfig::DEFAULT_WALK_DURATION_MS);

        let short = walk_once(&map, &characters, "w", Vector::new(13.0, 14.0));
        assert_eq!(short.position, Some(Vector::new(13.0, 14.0)));
    }

    #[test]
    fn collision_stops_at_combined_radius() {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([runner("w", 0, 10.0, 10.0), runner("rock", 0, 16.0, 10.0)]);

        let update = walk_once(&map, &characters, "w", Vector::new(30.0, 10.0));
        assert_eq!(update.result, UpdateResult::Collision);
        assert_eq!(update.collided_with, Some(CharacterId::new("rock")));
        let stop = update.position.unwrap();
        assert!(stop.approx_eq(Vector::new(14.0, 10.0), EPS));
        assert!((stop.distance(Vector::new(16.0, 10.0)) - 2.0).abs() < EPS);
    }

    #[test]
    fn picks_the_nearest_collider() {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([
            runner("w", 0, 10.0, 10.0),
            runner("a-far", 0, 19.0, 10.0),
            runner("b-near", 0, 15.0, 10.0),
        ]);

        let update = walk_once(&map, &characters, "w", Vector::new(30.0, 10.0));
        assert_eq!(update.collided_with, Some(CharacterId::new("b-near")));
    }

    #[test]
    fn overlap_behind_does_not_block() {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([runner("w", 0, 10.0, 10.0), runner("behind", 0, 9.0, 10.0)]);

        let update = walk_once(&map, &characters, "w", Vector::new(30.0, 10.0));
        assert_eq!(update.result, UpdateResult::Walk);
    }

    #[test]
    fn touching_collider_ahead_keeps_mover_in_place() {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([runner("w", 0, 10.0, 10.0), runner("rock", 0, 12.0, 10.0)]);

        let update = walk_once(&map, &characters, "w", Vector::new(30.0, 10.0));
        assert_eq!(update.result, UpdateResult::Collision);
        assert!(update.position.unwrap().approx_eq(Vector::new(10.0, 10.0), EPS));
    }

    #[test]
    fn boundary_clamps_position() {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([runner("w", 0, 5.0, 5.0)]);

        let update = walk_once(&map, &characters, "w", Vector::new(-100.0, 5.0));
        assert_eq!(update.result, UpdateResult::Collision);
        assert_eq!(update.collided_with, None);
        assert_eq!(update.position, Some(Vector::new(0.0, 5.0)));
    }

    #[test]
    fn exit_warps_when_nothing_blocks() {
        let map = WorldMap::new(Vector::new(400.0, 400.0)).with_exit(Exit::new(
            Vector::new(40.0, 10.0),
            10.0,
            "level-2",
        ));
        let characters = registry([runner("w", 10, 10.0, 10.0)]);

        let update = walk_once(&map, &characters, "w", Vector::new(40.0, 10.0));
        assert_eq!(update.result, UpdateResult::Warp);
        assert_eq!(update.destination.as_deref(), Some("level-2"));
    }

    #[test]
    fn nearer_character_beats_exit() {
        let map = WorldMap::new(Vector::new(400.0, 400.0)).with_exit(Exit::new(
            Vector::new(40.0, 10.0),
            10.0,
            "level-2",
        ));
        let characters = registry([runner("w", 10, 10.0, 10.0), runner("npc", 0, 20.0, 10.0)]);

        let update = walk_once(&map, &characters, "w", Vector::new(40.0, 10.0));
        assert_eq!(update.result, UpdateResult::Collision);
        assert_eq!(update.collided_with, Some(CharacterId::new("npc")));
    }

    #[test]
    fn orientation_walk_heads_along_orientation() {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([runner("w", 0, 10.0, 10.0)]);
        let mover = &characters[&CharacterId::new("w")];

        let update = rules()
            .walk(
                mover,
                Action::Walk,
                None,
                Some(Vector::new(0.0, 2.0)),
                World {
                    map: &map,
                    characters: &characters,
                },
            )
            .unwrap();
        assert!(update.position.unwrap().approx_eq(Vector::new(10.0, 20.0), EPS));
        assert!(update.orientation.unwrap().approx_eq(Vector::new(0.0, 1.0), EPS));
    }

    #[test]
    fn unplaced_mover_is_an_error() {
        let map = WorldMap::new(Vector::new(400.0, 400.0));
        let characters = registry([Character::new(CharacterData::new("w", json!({})))]);
        let mover = &characters[&CharacterId::new("w")];

        let err = rules()
            .walk(
                mover,
                Action::Walk,
                Some(Vector::ZERO),
                None,
                World {
                    map: &map,
                    characters: &characters,
                },
            )
            .unwrap_err();
        assert_eq!(err, RuleError::Unplaced(CharacterId::new("w"), Action::Walk));
    }
}
