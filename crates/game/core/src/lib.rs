//! Deterministic, tick-driven combat simulation shared by server and client.
//!
//! `skirmish-core` holds the canonical rules: characters and their derived
//! stats, dice pools, per-character state machines compiled from named
//! triggers, and the rule book turning states into updates. Everything runs
//! synchronously inside [`engine::GameEngine`]; hosting it (threads, tasks,
//! transport) is left to the embedding crate.
pub mod applier;
pub mod character;
pub mod config;
pub mod dice;
pub mod engine;
pub mod error;
pub mod events;
pub mod fsm;
pub mod math;
pub mod rules;
pub mod state;
pub mod transitions;
pub mod types;

pub use applier::ActionApplier;
pub use character::{Body, Character, CharacterData, Modifier, Sheet};
pub use config::EngineConfig;
pub use dice::{DiceRoll, MAX_POOL, RollSource, roll_dice};
pub use engine::{CharacterSnapshot, GameEngine, PlayerAction, Snapshot, TickReport};
pub use error::{ApplyError, CoreError, Result, RuleError};
pub use events::{EventBus, EventKey, EventKind, GameEvent, Role, StateKey};
pub use fsm::{Fsm, IntentStrategy};
pub use math::Vector;
pub use rules::{Exit, Resolution, RuleBook, SpawnLocation, Update, UpdateResult, World, WorldMap};
pub use state::{Action, State, StateFactory, StateKind, StateParams, Walk};
pub use transitions::{
    Handler, TransitionTable, Trigger, TriggerContext, TriggerName, TriggerRegistry,
};
pub use types::{CharacterId, StateId, Timestamp};
