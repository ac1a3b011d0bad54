//! Resolution of committed states into concrete outcomes.
//!
//! The [`RuleBook`] is pure with respect to the world: it reads characters and
//! the map, rolls dice through the injected [`RollSource`], and returns the
//! [`Update`]s describing what happened. Writing those updates back is the
//! applier's job.
//!
//! Two resolution modes share every geometric rule:
//! - [`Resolution::Authoritative`] rolls dice and places spawns (server)
//! - [`Resolution::Predictive`] never rolls and never spawns (client)
mod combat;
mod map;
mod movement;
mod spawn;
mod update;

use std::collections::BTreeMap;

pub use map::{Exit, SpawnLocation, WorldMap};
pub use update::{Update, UpdateResult};

use crate::character::{Character, facing_or_default};
use crate::config::EngineConfig;
use crate::dice::RollSource;
use crate::error::RuleError;
use crate::state::{Action, State, StateKind};
use crate::types::CharacterId;

/// Which side of the network the rule book runs on.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Resolution {
    #[default]
    Authoritative,
    Predictive,
}

/// Read-only view the rule book resolves against.
#[derive(Clone, Copy, Debug)]
pub struct World<'a> {
    pub map: &'a WorldMap,
    pub characters: &'a BTreeMap<CharacterId, Character>,
}

/// Turns states into updates.
#[derive(Clone, Debug)]
pub struct RuleBook {
    resolution: Resolution,
    spawn_attempts: u32,
    walk_duration_ms: u64,
    attack_duration_ms: u64,
    shoot_duration_ms: u64,
    defence_difficulty: u32,
}

impl RuleBook {
    pub fn new(resolution: Resolution, config: &EngineConfig) -> Self {
        Self {
            resolution,
            spawn_attempts: config.spawn_attempts,
            walk_duration_ms: config.walk_duration_ms,
            attack_duration_ms: config.attack_duration_ms,
            shoot_duration_ms: config.shoot_duration_ms,
            defence_difficulty: config.defence_difficulty,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Resolves `state` into zero or more updates.
    ///
    /// A state whose owner is gone resolves to nothing. Idle resolves to
    /// nothing as well.
    pub fn execute(
        &self,
        state: &State,
        world: World<'_>,
        rolls: &mut dyn RollSource,
    ) -> Result<Vec<Update>, RuleError> {
        let Some(owner) = world.characters.get(&state.owner) else {
            return Ok(Vec::new());
        };
        let action = state.action();
        match &state.kind {
            StateKind::Idle => Ok(Vec::new()),
            StateKind::Walk(walk) => self
                .walk(owner, action, walk.destination, walk.orientation, world)
                .map(|update| vec![update]),
            StateKind::BasicAttack { target } | StateKind::ContinuousAttack { target } => {
                self.attack(owner, action, target, world, rolls)
            }
            StateKind::Spawn { origin } => {
                let origin = origin.as_deref().or(owner.origin.as_deref());
                self.spawn(owner, origin, world, rolls)
            }
            StateKind::Shoot => self.shoot(owner).map(|update| vec![update]),
            StateKind::Die => Ok(vec![self.die(owner)]),
        }
    }

    fn shoot(&self, shooter: &Character) -> Result<Update, RuleError> {
        let position = shooter
            .position
            .ok_or_else(|| RuleError::Unplaced(shooter.id.clone(), Action::Shoot))?;
        let orientation = facing_or_default(shooter.orientation, position);
        let launch = position + orientation * shooter.move_speed();
        Ok(
            Update::new(shooter.id.clone(), Action::Shoot, UpdateResult::Shoot)
                .at(launch, orientation)
                .with_duration(self.shoot_duration_ms),
        )
    }

    fn die(&self, character: &Character) -> Update {
        Update::new(character.id.clone(), Action::Die, UpdateResult::Die).with_remaining_health(0.0)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::registry;
    use super::*;
    use crate::character::testing::{archer_sheet, character_at};
    use crate::dice::testing::FixedRolls;
    use crate::math::Vector;
    use crate::state::StateFactory;

    #[test]
    fn idle_and_missing_owner_resolve_to_nothing() {
        let config = EngineConfig::default();
        let rules = RuleBook::new(Resolution::Authoritative, &config);
        let mut factory = StateFactory::new(&config);
        let map = WorldMap::new(Vector::new(100.0, 100.0));
        let characters = registry([character_at("a", archer_sheet(), 5.0, 5.0)]);
        let world = World {
            map: &map,
            characters: &characters,
        };

        let idle = factory.build(StateKind::Idle, CharacterId::new("a"));
        assert!(rules.execute(&idle, world, &mut FixedRolls::face(5)).unwrap().is_empty());

        let ghost = factory.build(StateKind::Die, CharacterId::new("ghost"));
        assert!(rules.execute(&ghost, world, &mut FixedRolls::face(5)).unwrap().is_empty());
    }

    #[test]
    fn die_zeroes_health() {
        let config = EngineConfig::default();
        let rules = RuleBook::new(Resolution::Authoritative, &config);
        let mut factory = StateFactory::new(&config);
        let map = WorldMap::new(Vector::new(100.0, 100.0));
        let characters = registry([character_at("a", archer_sheet(), 5.0, 5.0)]);
        let world = World {
            map: &map,
            characters: &characters,
        };

        let die = factory.build(StateKind::Die, CharacterId::new("a"));
        let updates = rules.execute(&die, world, &mut FixedRolls::face(5)).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].result, UpdateResult::Die);
        assert_eq!(updates[0].remaining_health, Some(0.0));
        assert_eq!(updates[0].duration, 0);
        assert!(updates[0].is_lethal());
    }

    #[test]
    fn shoot_launches_ahead_of_the_shooter() {
        let config = EngineConfig::default();
        let rules = RuleBook::new(Resolution::Authoritative, &config);
        let mut factory = StateFactory::new(&config);
        let map = WorldMap::new(Vector::new(100.0, 100.0));
        let mut archer = character_at("a", archer_sheet(), 10.0, 10.0);
        archer.orientation = Some(Vector::new(1.0, 0.0));
        let speed = archer.move_speed();
        let characters = registry([archer]);
        let world = World {
            map: &map,
            characters: &characters,
        };

        let shoot = factory.build(StateKind::Shoot, CharacterId::new("a"));
        let updates = rules.execute(&shoot, world, &mut FixedRolls::face(5)).unwrap();
        assert_eq!(updates[0].result, UpdateResult::Shoot);
        assert_eq!(updates[0].position, Some(Vector::new(10.0 + speed, 10.0)));
        assert_eq!(updates[0].duration, EngineConfig::DEFAULT_SHOOT_DURATION_MS);
    }
}
