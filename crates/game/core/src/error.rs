//! Error types for the simulation core.
//!
//! Three families, one per boundary:
//! - [`CoreError`]: configuration mistakes, surfaced at build time
//! - [`RuleError`]: failures while resolving a state into updates
//! - [`ApplyError`]: failures while writing an update onto a character

use crate::state::Action;
use crate::types::CharacterId;

pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// Misconfiguration detected while building states, tables or characters.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("no state by the name: {0}")]
    UnknownAction(String),

    #[error("no transition trigger by the name: {0}")]
    UnknownTrigger(String),

    #[error("{action} state requires a {field}")]
    MissingParameter { action: Action, field: &'static str },

    #[error("character {0} is already registered")]
    DuplicateCharacter(CharacterId),
}

/// Resolution failures raised by the rule book.
///
/// These never abort a tick; the engine lists them in the tick's report.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum RuleError {
    #[error("no free spawn position for {character} after {attempts} attempts per location")]
    SpawnExhausted {
        character: CharacterId,
        attempts: u32,
    },

    #[error("map has no spawn locations for {0}")]
    NoSpawnLocations(CharacterId),

    #[error("{1} requires {0} to be placed on the map")]
    Unplaced(CharacterId, Action),
}

impl RuleError {
    /// Character the failed resolution belonged to.
    pub fn character(&self) -> &CharacterId {
        match self {
            RuleError::SpawnExhausted { character, .. } => character,
            RuleError::NoSpawnLocations(character) | RuleError::Unplaced(character, _) => character,
        }
    }
}

/// Failures writing an update onto the character registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("character {0} is not registered")]
    MissingCharacter(CharacterId),
}
