//! Characters: a read-only sheet plus the mutable bits the simulation owns.
//!
//! Stats are never cached. Every derived getter reads the sheet through
//! [`Character::get`], so active [`Modifier`]s are always reflected.
//! Projectiles share the type but answer derived getters from fixed numbers
//! (see [`Body`]).

mod modifiers;
mod sheet;
mod stats;

pub use modifiers::{ActiveModifier, Modifier, ModifierSet};
pub use sheet::{Sheet, lookup, lookup_keys, lookup_number, lookup_str};
pub use stats::{PROJECTILE_MOVE_SPEED, PROJECTILE_RADIUS, PROJECTILE_WEAPON_DAMAGE};

use crate::math::Vector;
use crate::types::{CharacterId, Timestamp};

/// Collision radius used when the content does not specify one.
pub const DEFAULT_RADIUS: f64 = 4.0;

/// Construction input for a character, as provided by content or transport.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterData {
    pub id: CharacterId,
    pub sheet: Sheet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Option<Vector>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub orientation: Option<Vector>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub radius: Option<f64>,
    /// Preferred spawn location tag.
    #[cfg_attr(feature = "serde", serde(default))]
    pub origin: Option<String>,
}

impl CharacterData {
    pub fn new(id: impl Into<CharacterId>, sheet: Sheet) -> Self {
        Self {
            id: id.into(),
            sheet,
            position: None,
            orientation: None,
            radius: None,
            origin: None,
        }
    }

    pub fn at(mut self, position: Vector) -> Self {
        self.position = Some(position);
        self
    }

    pub fn facing(mut self, orientation: Vector) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// What kind of body answers the derived getters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Body {
    /// Stats come from the sheet plus modifiers.
    Sheet,
    /// Fixed-stat missile that never collides with whoever fired it.
    Projectile { owner: CharacterId },
}

/// A simulated character.
#[derive(Clone, Debug, PartialEq)]
pub struct Character {
    pub id: CharacterId,
    pub sheet: Sheet,
    /// `None` until the character has been spawned somewhere on the map.
    pub position: Option<Vector>,
    pub orientation: Option<Vector>,
    pub radius: f64,
    pub origin: Option<String>,
    pub modifiers: ModifierSet,
    body: Body,
    health: f64,
}

impl Character {
    pub fn new(data: CharacterData) -> Self {
        let orientation = data
            .orientation
            .or_else(|| data.position.map(default_orientation));
        let mut character = Self {
            id: data.id,
            sheet: data.sheet,
            position: data.position,
            orientation,
            radius: data.radius.unwrap_or(DEFAULT_RADIUS),
            origin: data.origin,
            modifiers: ModifierSet::new(),
            body: Body::Sheet,
            health: 0.0,
        };
        character.health = character.max_health();
        character
    }

    /// Builds a projectile fired by `owner`.
    pub fn projectile(
        id: CharacterId,
        owner: CharacterId,
        position: Vector,
        orientation: Vector,
    ) -> Self {
        let mut character = Self {
            id,
            sheet: serde_json::json!({ "maxHealth": 1 }),
            position: Some(position),
            orientation: Some(orientation),
            radius: PROJECTILE_RADIUS,
            origin: None,
            modifiers: ModifierSet::new(),
            body: Body::Projectile { owner },
            health: 0.0,
        };
        character.health = character.max_health();
        character
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn is_projectile(&self) -> bool {
        matches!(self.body, Body::Projectile { .. })
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    /// Sets health, clamped into `[0, max_health]`.
    pub fn set_health(&mut self, health: f64) {
        self.health = health.clamp(0.0, self.max_health().max(0.0));
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_spawned(&self) -> bool {
        self.position.is_some()
    }

    /// Sheet value at `path` plus modifiers registered for exactly that path.
    pub fn get(&self, path: &str) -> f64 {
        self.get_base(path) + self.modifiers.sum(path)
    }

    /// Sheet value at `path`, `0.0` for anything missing.
    pub fn get_base(&self, path: &str) -> f64 {
        lookup_number(&self.sheet, path)
    }

    pub fn add_modifiers(&mut self, modifiers: impl IntoIterator<Item = Modifier>) {
        self.modifiers.add(modifiers);
    }

    /// Drops modifiers that expired before `now`.
    pub fn update_modifiers(&mut self, now: Timestamp) {
        self.modifiers.prune(now);
    }

    /// Whether moving into `other` counts as a collision for this character.
    pub fn collides_with(&self, other: &Character) -> bool {
        match &self.body {
            Body::Sheet => self.id != other.id,
            Body::Projectile { owner } => self.id != other.id && *owner != other.id,
        }
    }

    /// Places the character and turns it to face `orientation`.
    pub fn place(&mut self, position: Vector, orientation: Option<Vector>) {
        self.position = Some(position);
        if let Some(orientation) = orientation {
            self.orientation = Some(orientation);
        }
    }
}

/// Facing used when nothing else is known: away from the map origin.
pub fn default_orientation(position: Vector) -> Vector {
    if position.norm() == 0.0 {
        Vector::new(0.0, 1.0)
    } else {
        position.normalize()
    }
}

/// Unit heading from `orientation`, falling back to [`default_orientation`]
/// when it is missing or has no length.
pub fn facing_or_default(orientation: Option<Vector>, position: Vector) -> Vector {
    match orientation {
        Some(orientation) if orientation.norm() > 0.0 => orientation.normalize(),
        _ => default_orientation(position),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use serde_json::{Value, json};

    use super::{Character, CharacterData};
    use crate::math::Vector;

    /// Melee fighter with an axe.
    pub fn axe_sheet() -> Value {
        json!({
            "maxHealth": 7,
            "attributes": {
                "physical": { "strength": 2, "dexterity": 2, "stamina": 2 },
                "mental": { "perception": 1 }
            },
            "abilities": {
                "talents": { "athletics": 1, "dodge": 1, "alertness": 1 },
                "skills": { "melee": 2 }
            },
            "items": {
                "weapon": { "type": "AXE", "damage": 4, "range": 1, "difficulty": 6 }
            }
        })
    }

    /// Archer with a long-range bow.
    pub fn archer_sheet() -> Value {
        json!({
            "maxHealth": 7,
            "attributes": {
                "physical": { "strength": 1, "dexterity": 2, "stamina": 3 },
                "mental": { "perception": 2 }
            },
            "abilities": {
                "talents": { "athletics": 2, "dodge": 2, "alertness": 1 },
                "skills": { "archery": 2 }
            },
            "items": {
                "weapon": { "type": "BOW", "damage": 7, "range": 20, "difficulty": 6 }
            }
        })
    }

    pub fn character_at(id: &str, sheet: Value, x: f64, z: f64) -> Character {
        Character::new(CharacterData::new(id, sheet).at(Vector::new(x, z)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::{archer_sheet, axe_sheet, character_at};
    use super::*;

    #[test]
    fn starts_at_max_health() {
        let character = character_at("axe", axe_sheet(), 0.0, 0.0);
        assert_eq!(character.health(), 7.0);
        assert!(character.is_alive());
    }

    #[test]
    fn health_is_clamped() {
        let mut character = character_at("axe", axe_sheet(), 0.0, 0.0);
        character.set_health(-3.0);
        assert_eq!(character.health(), 0.0);
        character.set_health(100.0);
        assert_eq!(character.health(), 7.0);
    }

    #[test]
    fn get_base_of_unknown_path_is_zero() {
        for sheet in [axe_sheet(), archer_sheet(), json!({}), json!(null)] {
            let character = Character::new(CharacterData::new("c", sheet));
            assert_eq!(character.get_base("no.such.path"), 0.0);
            assert_eq!(character.get("no.such.path"), 0.0);
        }
    }

    #[test]
    fn get_adds_unexpired_modifiers() {
        let mut character = character_at("axe", axe_sheet(), 0.0, 0.0);
        let path = "attributes.physical.dexterity";

        character.add_modifiers([
            Modifier::new(path, 1.0, Timestamp(100), "haste"),
            Modifier::new(path, 3.0, Timestamp(100), "haste"),
            Modifier::new(path, -1.0, Timestamp(50), "mud"),
        ]);
        // Later "haste" wins over the earlier one.
        assert_eq!(character.get(path), 2.0 + 3.0 - 1.0);

        character.update_modifiers(Timestamp(60));
        assert_eq!(character.get(path), 2.0 + 3.0);

        character.update_modifiers(Timestamp(101));
        assert_eq!(character.get(path), 2.0);
    }

    #[test]
    fn projectile_ignores_owner_and_itself() {
        let owner = character_at("archer", archer_sheet(), 0.0, 0.0);
        let other = character_at("axe", axe_sheet(), 5.0, 0.0);
        let shot = Character::projectile(
            CharacterId::new("shot-1"),
            owner.id.clone(),
            Vector::new(1.0, 0.0),
            Vector::new(1.0, 0.0),
        );

        assert!(!shot.collides_with(&owner));
        assert!(!shot.collides_with(&shot));
        assert!(shot.collides_with(&other));
        assert!(owner.collides_with(&shot));
    }

    #[test]
    fn default_orientation_faces_away_from_origin() {
        let character = character_at("axe", axe_sheet(), 3.0, 4.0);
        let orientation = character.orientation.unwrap();
        assert!(orientation.approx_eq(Vector::new(0.6, 0.8), 1e-9));

        let unplaced = Character::new(CharacterData::new("x", axe_sheet()));
        assert!(unplaced.orientation.is_none());
        assert!(!unplaced.is_spawned());
    }
}
