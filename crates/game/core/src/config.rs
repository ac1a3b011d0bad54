use crate::transitions::TriggerName;

/// Engine-wide tunables.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Seed for the engine's dice and placement generator.
    pub seed: u64,
    /// Random placements tried per spawn location before moving on.
    pub spawn_attempts: u32,
    /// How long an unplaced character waits before retrying a spawn.
    pub spawn_retry_ms: u64,
    /// Duration of one walk step.
    pub walk_duration_ms: u64,
    /// Duration of a basic or continuous attack at attack speed 1.
    pub attack_duration_ms: u64,
    pub shoot_duration_ms: u64,
    /// Difficulty of dodge, damage and armour rolls.
    pub defence_difficulty: u32,
    /// Triggers every player gets on top of the ones it joins with.
    pub default_player_triggers: Vec<String>,
}

impl EngineConfig {
    pub const DEFAULT_SEED: u64 = 0;
    pub const DEFAULT_SPAWN_ATTEMPTS: u32 = 100;
    pub const DEFAULT_SPAWN_RETRY_MS: u64 = 100;
    pub const DEFAULT_WALK_DURATION_MS: u64 = 100;
    pub const DEFAULT_ATTACK_DURATION_MS: u64 = 1000;
    pub const DEFAULT_SHOOT_DURATION_MS: u64 = 500;
    pub const DEFAULT_DEFENCE_DIFFICULTY: u32 = 7;

    pub fn new() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            spawn_attempts: Self::DEFAULT_SPAWN_ATTEMPTS,
            spawn_retry_ms: Self::DEFAULT_SPAWN_RETRY_MS,
            walk_duration_ms: Self::DEFAULT_WALK_DURATION_MS,
            attack_duration_ms: Self::DEFAULT_ATTACK_DURATION_MS,
            shoot_duration_ms: Self::DEFAULT_SHOOT_DURATION_MS,
            defence_difficulty: Self::DEFAULT_DEFENCE_DIFFICULTY,
            default_player_triggers: vec![TriggerName::IdleAfterCollision.to_string()],
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::new()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
