//! Derived combat and movement numbers.
//!
//! Each getter is one formula from the rule book. Projectiles answer from
//! fixed constants instead of walking the sheet.

use super::{Body, Character, lookup_keys};
use crate::dice::MAX_POOL;

pub const PROJECTILE_MOVE_SPEED: f64 = 10.0;
pub const PROJECTILE_WEAPON_DAMAGE: f64 = 6.0;
pub const PROJECTILE_HIT_POOL: u32 = 6;
pub const PROJECTILE_RANGE: f64 = 1.0;
pub const PROJECTILE_RADIUS: f64 = 1.0;

/// Weapon range when the sheet has none.
pub const DEFAULT_WEAPON_RANGE: f64 = 4.0;
/// Hit difficulty when the weapon has none.
pub const DEFAULT_WEAPON_DIFFICULTY: f64 = 6.0;

impl Character {
    pub fn max_health(&self) -> f64 {
        self.get("maxHealth")
    }

    pub fn move_speed(&self) -> f64 {
        match self.body {
            Body::Projectile { .. } => PROJECTILE_MOVE_SPEED,
            Body::Sheet => {
                10.0 + 3.0
                    * (self.get("attributes.physical.dexterity")
                        + self.get("abilities.talents.athletics"))
            }
        }
    }

    /// Attacks per second.
    pub fn attack_speed(&self) -> f64 {
        1.0
    }

    pub fn view_range(&self) -> f64 {
        match self.body {
            Body::Projectile { .. } => 0.0,
            Body::Sheet => {
                20.0 + 4.0
                    * (self.get("attributes.mental.perception")
                        + self.get("abilities.talents.alertness"))
            }
        }
    }

    /// Armor pool: stamina plus the armour of every carried item.
    pub fn armor(&self) -> f64 {
        if self.is_projectile() {
            return 0.0;
        }
        self.get("attributes.physical.stamina") + self.sum_over_items("armour")
    }

    pub fn weapon_type(&self) -> Option<&str> {
        match self.body {
            Body::Projectile { .. } => None,
            Body::Sheet => super::lookup_str(&self.sheet, "items.weapon.type"),
        }
    }

    /// Damage pool; bows do not add strength.
    pub fn weapon_damage(&self) -> f64 {
        match self.body {
            Body::Projectile { .. } => PROJECTILE_WEAPON_DAMAGE,
            Body::Sheet => {
                let base = self.get("items.weapon.damage");
                if self.weapon_type() == Some("BOW") {
                    base
                } else {
                    base + self.get("attributes.physical.strength")
                }
            }
        }
    }

    pub fn weapon_range(&self) -> f64 {
        match self.body {
            Body::Projectile { .. } => PROJECTILE_RANGE,
            Body::Sheet => positive_or(self.get("items.weapon.range"), DEFAULT_WEAPON_RANGE),
        }
    }

    pub fn weapon_difficulty(&self) -> f64 {
        positive_or(self.get("items.weapon.difficulty"), DEFAULT_WEAPON_DIFFICULTY)
    }

    /// Penalty from lost health: minus one die per two points missing.
    pub fn damage_taken_handicap(&self) -> f64 {
        let damage_taken = (self.max_health() - self.health()).max(0.0);
        -(damage_taken / 2.0).floor()
    }

    /// Damage-taken penalty plus every item's dexterity handicap.
    pub fn dexterity_handicap(&self) -> f64 {
        self.damage_taken_handicap() - self.sum_over_items("dexterityHandicap")
    }

    pub fn ability_for_weapon(&self) -> f64 {
        match self.weapon_type() {
            Some("BOW") => self.get("abilities.skills.archery"),
            Some("SWORD" | "DAGGER" | "AXE" | "CLUB") => self.get("abilities.skills.melee"),
            _ => self.get("abilities.talents.brawl"),
        }
    }

    /// Dice rolled to land a basic attack.
    pub fn hit_pool(&self) -> u32 {
        match self.body {
            Body::Projectile { .. } => PROJECTILE_HIT_POOL,
            Body::Sheet => to_pool(
                self.get("attributes.physical.dexterity")
                    + self.ability_for_weapon()
                    + self.dexterity_handicap(),
            ),
        }
    }

    /// Dice rolled to avoid a basic attack.
    pub fn dodge_pool(&self) -> u32 {
        match self.body {
            Body::Projectile { .. } => 0,
            Body::Sheet => to_pool(
                self.get("attributes.physical.dexterity")
                    + self.get("abilities.talents.dodge")
                    + self.dexterity_handicap(),
            ),
        }
    }

    pub fn armor_pool(&self) -> u32 {
        to_pool(self.armor())
    }

    pub fn damage_pool(&self, extra_successes: u32) -> u32 {
        to_pool(self.weapon_damage() + f64::from(extra_successes))
    }

    fn sum_over_items(&self, field: &str) -> f64 {
        lookup_keys(&self.sheet, "items")
            .into_iter()
            .map(|item| self.get(&format!("items.{item}.{field}")))
            .sum()
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value > 0.0 { value } else { fallback }
}

fn to_pool(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.floor().min(f64::from(MAX_POOL)) as u32
    } else {
        0
    }
}
