//! Events flowing through the engine and the subscriptions that route them.

use std::collections::{BTreeMap, BTreeSet};

use crate::rules::Update;
use crate::state::Action;
use crate::types::CharacterId;

/// How a character participates in the simulation.
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
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum Role {
    /// Human-driven; accepts queued intents and starts by spawning.
    Player,
    /// Autonomous, driven purely by its transition table.
    #[default]
    Npc,
    /// Static decoration: collides but never ticks.
    Scenery,
    /// Engine-spawned missile.
    Projectile,
}

impl Role {
    /// Whether characters with this role get an FSM.
    pub fn has_fsm(self) -> bool {
        !matches!(self, Role::Scenery)
    }
}

/// Everything that can travel over the engine's bus.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")
)]
pub enum GameEvent {
    NewCharacter {
        character: CharacterId,
        character_type: Role,
    },
    RmCharacter {
        character_id: CharacterId,
    },
    CharacterUpdate(Update),
    /// Arbitrary named event injected by a collaborator.
    Signal {
        name: String,
    },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::NewCharacter { .. } => EventKind::NewCharacter,
            GameEvent::RmCharacter { .. } => EventKind::RmCharacter,
            GameEvent::CharacterUpdate(_) => EventKind::CharacterUpdate,
            GameEvent::Signal { .. } => EventKind::Signal,
        }
    }

    /// Keys this event matches, most specific first.
    pub fn keys(&self) -> Vec<EventKey> {
        let mut keys = Vec::with_capacity(3);
        if let GameEvent::Signal { name } = self {
            keys.push(EventKey::Named(name.clone()));
        }
        keys.push(EventKey::Kind(self.kind()));
        keys.push(EventKey::Any);
        keys
    }

    pub fn signal(name: impl Into<String>) -> Self {
        GameEvent::Signal { name: name.into() }
    }

    pub fn as_update(&self) -> Option<&Update> {
        match self {
            GameEvent::CharacterUpdate(update) => Some(update),
            _ => None,
        }
    }
}

/// Fieldless tag of a [`GameEvent`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[strum(serialize_all = "camelCase")]
pub enum EventKind {
    NewCharacter,
    RmCharacter,
    CharacterUpdate,
    Signal,
}

/// First level of a transition table: which events a clause listens to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKey {
    Any,
    Kind(EventKind),
    /// A signal with exactly this name.
    Named(String),
}

impl EventKey {
    pub fn named(name: impl Into<String>) -> Self {
        EventKey::Named(name.into())
    }
}

/// Second level of a transition table: which states a clause applies in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateKey {
    Any,
    Action(Action),
}

/// Routes events to the FSMs that subscribed to them.
///
/// Subscribers under [`EventKey::Any`] receive every event. Recipients are
/// returned in id order so dispatch is deterministic.
#[derive(Clone, Debug, Default)]
pub struct EventBus {
    subscribers: BTreeMap<EventKey, BTreeSet<CharacterId>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, character: &CharacterId, keys: impl IntoIterator<Item = EventKey>) {
        for key in keys {
            self.subscribers
                .entry(key)
                .or_default()
                .insert(character.clone());
        }
    }

    /// Removes every subscription held by `character`.
    pub fn unsubscribe(&mut self, character: &CharacterId) {
        self.subscribers.retain(|_, ids| {
            ids.remove(character);
            !ids.is_empty()
        });
    }

    pub fn recipients(&self, event: &GameEvent) -> BTreeSet<CharacterId> {
        event
            .keys()
            .iter()
            .filter_map(|key| self.subscribers.get(key))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn is_subscribed(&self, character: &CharacterId) -> bool {
        self.subscribers.values().any(|ids| ids.contains(character))
    }
}
