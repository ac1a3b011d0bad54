use crate::character::Sheet;
use crate::math::Vector;
use crate::state::Action;
use crate::types::{CharacterId, Timestamp};

/// Outcome tag of an [`Update`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[strum(serialize_all = "camelCase")]
pub enum UpdateResult {
    Walk,
    Collision,
    Warp,
    Damaged,
    Dodge,
    Block,
    Missed,
    Spawn,
    Idle,
    Die,
    Shoot,
}

impl UpdateResult {
    /// Results of an attack that reached its target.
    pub fn is_attack_outcome(self) -> bool {
        matches!(
            self,
            UpdateResult::Damaged | UpdateResult::Dodge | UpdateResult::Block | UpdateResult::Missed
        )
    }

    /// Results that carry a movement of the subject character.
    pub fn moves_character(self) -> bool {
        matches!(
            self,
            UpdateResult::Walk | UpdateResult::Collision | UpdateResult::Warp | UpdateResult::Spawn
        )
    }
}

/// One resolved outcome, produced by the rule book and consumed once.
///
/// `character` is the subject the outcome happened to: the mover for walks,
/// the defender for attacks.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Update {
    pub character: CharacterId,
    /// Action of the state that produced this outcome.
    pub action: Action,
    pub result: UpdateResult,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub position: Option<Vector>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub orientation: Option<Vector>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub remaining_health: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub damage: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub aggressor: Option<CharacterId>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub collided_with: Option<CharacterId>,
    /// Exit destination marker on warps.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub destination: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub speed: Option<f64>,
    /// Sheet of a freshly spawned character, so remote peers can build it.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub sheet: Option<Sheet>,
    pub duration: u64,
    pub timestamp: Timestamp,
}

impl Update {
    pub fn new(character: CharacterId, action: Action, result: UpdateResult) -> Self {
        Self {
            character,
            action,
            result,
            position: None,
            orientation: None,
            remaining_health: None,
            damage: None,
            aggressor: None,
            collided_with: None,
            destination: None,
            speed: None,
            sheet: None,
            duration: 0,
            timestamp: Timestamp::ZERO,
        }
    }

    pub fn at(mut self, position: Vector, orientation: Vector) -> Self {
        self.position = Some(position);
        self.orientation = Some(orientation);
        self
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_aggressor(mut self, aggressor: CharacterId) -> Self {
        self.aggressor = Some(aggressor);
        self
    }

    pub fn with_damage(mut self, damage: f64, remaining_health: f64) -> Self {
        self.damage = Some(damage);
        self.remaining_health = Some(remaining_health);
        self
    }

    pub fn with_remaining_health(mut self, remaining_health: f64) -> Self {
        self.remaining_health = Some(remaining_health);
        self
    }

    pub fn with_collider(mut self, collider: CharacterId) -> Self {
        self.collided_with = Some(collider);
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheet = Some(sheet);
        self
    }

    /// Whether applying this update leaves its subject dead.
    pub fn is_lethal(&self) -> bool {
        self.result == UpdateResult::Die || self.remaining_health.is_some_and(|health| health <= 0.0)
    }
}
