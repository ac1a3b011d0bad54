//! Success-counting d10 dice pools.
//!
//! A pool of `n` ten-sided dice is rolled against a difficulty. Every die
//! showing 1 is a botch and cancels a success, a 10 is a critical success,
//! and anything at or above the difficulty is a plain success.
//!
//! Randomness is injected through [`RollSource`] so a seeded generator (or a
//! scripted one in tests) replays the exact same outcomes.

use rand::{Rng, RngCore};

/// Number of faces on every die in a pool.
pub const DICE_FACES: u32 = 10;

/// Largest pool ever rolled; bigger requests are clamped.
pub const MAX_POOL: u32 = 50;

/// Source of randomness for dice and placement rolls.
///
/// Every [`rand::RngCore`] is a `RollSource`; tests can supply scripted
/// sources to force specific faces.
pub trait RollSource {
    /// Roll a single die, returning a face in `1..=DICE_FACES`.
    fn roll_d10(&mut self) -> u32;

    /// Uniform sample in `[0, 1)`.
    fn unit(&mut self) -> f64;
}

impl<R: RngCore> RollSource for R {
    fn roll_d10(&mut self) -> u32 {
        self.gen_range(1..=DICE_FACES)
    }

    fn unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }
}

/// Tally of a single pool roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiceRoll {
    pub success: u32,
    pub botches: u32,
    pub critics: u32,
    pub fails: u32,
    /// `(success + critics) - botches`, always within `[-pool, pool]`.
    pub total: i32,
}

impl DiceRoll {
    /// Number of dice that were rolled.
    pub fn pool(&self) -> u32 {
        self.success + self.botches + self.critics + self.fails
    }
}

/// Rolls `pool` d10 against `difficulty`.
///
/// Pools above [`MAX_POOL`] roll [`MAX_POOL`] dice.
pub fn roll_dice(source: &mut (impl RollSource + ?Sized), pool: u32, difficulty: u32) -> DiceRoll {
    if pool > MAX_POOL {
        tracing::debug!(pool, max = MAX_POOL, "dice pool clamped");
    }
    let mut roll = DiceRoll::default();
    for _ in 0..pool.min(MAX_POOL) {
        let face = source.roll_d10();
        if face <= 1 {
            roll.botches += 1;
        } else if face >= DICE_FACES {
            roll.critics += 1;
        } else if face >= difficulty {
            roll.success += 1;
        } else {
            roll.fails += 1;
        }
    }
    roll.total = dice_count(roll.success + roll.critics) - dice_count(roll.botches);
    roll
}

fn dice_count(dice: u32) -> i32 {
    i32::try_from(dice).unwrap_or(i32::MAX)
}

/// Deterministic roll sources for tests and replays.
pub mod testing {
    use std::collections::VecDeque;

    use super::RollSource;

    /// Always rolls the same face and unit sample.
    #[derive(Clone, Copy, Debug)]
    pub struct FixedRolls {
        pub face: u32,
        pub unit: f64,
    }

    impl FixedRolls {
        pub fn face(face: u32) -> Self {
            Self { face, unit: 0.5 }
        }
    }

    impl RollSource for FixedRolls {
        fn roll_d10(&mut self) -> u32 {
            self.face
        }

        fn unit(&mut self) -> f64 {
            self.unit
        }
    }

    /// Replays a scripted sequence of faces, then falls back to `fallback`.
    #[derive(Clone, Debug)]
    pub struct ScriptedRolls {
        pub faces: VecDeque<u32>,
        pub fallback: u32,
    }

    impl ScriptedRolls {
        pub fn new(faces: impl IntoIterator<Item = u32>, fallback: u32) -> Self {
            Self {
                faces: faces.into_iter().collect(),
                fallback,
            }
        }
    }

    impl RollSource for ScriptedRolls {
        fn roll_d10(&mut self) -> u32 {
            self.faces.pop_front().unwrap_or(self.fallback)
        }

        fn unit(&mut self) -> f64 {
            0.5
        }
    }
}
