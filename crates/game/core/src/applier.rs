//! Executes states against the registry and writes the outcomes back.

use std::collections::BTreeMap;

use crate::character::Character;
use crate::dice::RollSource;
use crate::error::{ApplyError, RuleError};
use crate::rules::{RuleBook, Update, UpdateResult, World, WorldMap};
use crate::state::State;
use crate::types::{CharacterId, Timestamp};

/// Bridges the [`RuleBook`] and the character registry.
#[derive(Clone, Debug)]
pub struct ActionApplier {
    rules: RuleBook,
}

impl ActionApplier {
    pub fn new(rules: RuleBook) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Resolves `state`, stamps the outcomes with `now` and applies them.
    ///
    /// Resolution failures are logged and returned so the caller can report
    /// them; nothing is applied then. An update about a character that
    /// vanished meanwhile is logged and dropped on its own. The returned
    /// updates are the ones that were applied.
    pub fn execute(
        &self,
        state: &State,
        now: Timestamp,
        map: &WorldMap,
        characters: &mut BTreeMap<CharacterId, Character>,
        rolls: &mut dyn RollSource,
    ) -> Result<Vec<Update>, RuleError> {
        let world = World {
            map,
            characters: &*characters,
        };
        let updates = match self.rules.execute(state, world, rolls) {
            Ok(updates) => updates,
            Err(error) => {
                tracing::warn!(
                    character = %error.character(),
                    action = %state.action(),
                    "state resolution failed: {error}"
                );
                return Err(error);
            }
        };

        Ok(updates
            .into_iter()
            .filter_map(|mut update| {
                update.timestamp = now;
                match apply(&update, characters) {
                    Ok(()) => Some(update),
                    Err(error) => {
                        tracing::warn!(result = %update.result, "dropping update: {error}");
                        None
                    }
                }
            })
            .collect())
    }
}

/// Writes one update onto its subject character.
///
/// Health follows `remaining_health` when present. Movement results place
/// the character; any other result only turns it.
pub fn apply(
    update: &Update,
    characters: &mut BTreeMap<CharacterId, Character>,
) -> Result<(), ApplyError> {
    let character = characters
        .get_mut(&update.character)
        .ok_or_else(|| ApplyError::MissingCharacter(update.character.clone()))?;

    if let Some(remaining) = update.remaining_health {
        character.set_health(remaining);
    }
    if update.result == UpdateResult::Die {
        character.set_health(0.0);
    }
    if let Some(sheet) = &update.sheet {
        character.sheet = sheet.clone();
    }
    match (update.result.moves_character(), update.position) {
        (true, Some(position)) => character.place(position, update.orientation),
        _ if update.result == UpdateResult::Shoot => {
            if let Some(orientation) = update.orientation {
                character.orientation = Some(orientation);
            }
        }
        _ => {}
    }
    Ok(())
}
