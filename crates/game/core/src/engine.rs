//! Tick loop orchestrating FSMs, rules and event publication.
//!
//! The [`GameEngine`] owns the character registry, one [`Fsm`] per active
//! character and the event routing between them. A tick runs in fixed
//! phases:
//!
//! 1. client only: drain buffered server updates
//! 2. prune expired modifiers
//! 3. tick every FSM and collect the states that became active
//! 4. execute that batch, publishing each update as it is applied
//!
//! Publication is synchronous, so an update produced early in a tick can
//! stage transitions for FSMs later in the same tick. Staged states are only
//! committed on a later tick, which keeps a tick's outcome independent of the
//! order FSMs are visited in.

use std::collections::{BTreeMap, VecDeque};
use std::mem;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::applier::{self, ActionApplier};
use crate::character::{Character, CharacterData, Sheet};
use crate::config::EngineConfig;
use crate::dice::RollSource;
use crate::error::{CoreError, Result, RuleError};
use crate::events::{EventBus, GameEvent, Role};
use crate::fsm::{Fsm, IntentStrategy};
use crate::math::Vector;
use crate::rules::{Resolution, RuleBook, Update, UpdateResult, WorldMap};
use crate::state::{State, StateFactory, StateKind, StateParams, Walk};
use crate::transitions::{PROJECTILE_TRIGGERS, TriggerRegistry};
use crate::types::{CharacterId, Timestamp};

/// A player's request to perform an action, as received from transport.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerAction {
    pub character: CharacterId,
    /// Action name, e.g. `basicAttack`.
    pub action: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: StateParams,
}

impl PlayerAction {
    pub fn new(character: impl Into<CharacterId>, action: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            action: action.into(),
            params: StateParams::default(),
        }
    }

    pub fn with_params(mut self, params: StateParams) -> Self {
        self.params = params;
        self
    }
}

/// What one tick did.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickReport {
    pub timestamp: Timestamp,
    /// States that became active this tick.
    pub transitions: usize,
    /// Updates applied this tick, in publication order.
    pub updates: Vec<Update>,
    /// Characters removed by the tick's outcomes.
    pub removed: Vec<CharacterId>,
    /// Projectiles materialized this tick.
    pub spawned: Vec<CharacterId>,
    /// States that could not be resolved, e.g. a spawn with no free spot.
    pub failures: Vec<RuleError>,
}

/// Full world state for late joiners.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub map: WorldMap,
    pub characters: Vec<CharacterSnapshot>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CharacterSnapshot {
    pub id: CharacterId,
    pub role: Role,
    pub position: Option<Vector>,
    pub orientation: Option<Vector>,
    pub health: f64,
    pub sheet: Sheet,
    /// `None` for scenery.
    pub state: Option<State>,
}

/// Simulation engine, either authoritative (server) or predictive (client).
pub struct GameEngine {
    config: EngineConfig,
    map: WorldMap,
    characters: BTreeMap<CharacterId, Character>,
    roles: BTreeMap<CharacterId, Role>,
    fsms: BTreeMap<CharacterId, Fsm>,
    bus: EventBus,
    registry: TriggerRegistry,
    factory: StateFactory,
    applier: ActionApplier,
    rolls: Box<dyn RollSource + Send>,
    /// Server updates waiting for the next client tick.
    inbound: VecDeque<Update>,
    outbox: Vec<GameEvent>,
    shots_fired: u64,
}

impl GameEngine {
    pub fn new(resolution: Resolution, config: EngineConfig, map: WorldMap) -> Self {
        Self {
            map,
            characters: BTreeMap::new(),
            roles: BTreeMap::new(),
            fsms: BTreeMap::new(),
            bus: EventBus::new(),
            registry: TriggerRegistry::standard(),
            factory: StateFactory::new(&config),
            applier: ActionApplier::new(RuleBook::new(resolution, &config)),
            rolls: Box::new(ChaCha8Rng::seed_from_u64(config.seed)),
            inbound: VecDeque::new(),
            outbox: Vec::new(),
            shots_fired: 0,
            config,
        }
    }

    /// Authoritative engine: rolls dice, places spawns, removes the fallen.
    pub fn server(config: EngineConfig, map: WorldMap) -> Self {
        Self::new(Resolution::Authoritative, config, map)
    }

    /// Predictive engine fed with server updates.
    pub fn client(config: EngineConfig, map: WorldMap) -> Self {
        Self::new(Resolution::Predictive, config, map)
    }

    /// Replaces the seeded generator, e.g. with scripted rolls.
    pub fn with_rolls(mut self, rolls: Box<dyn RollSource + Send>) -> Self {
        self.rolls = rolls;
        self
    }

    pub fn with_registry(mut self, registry: TriggerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry_mut(&mut self) -> &mut TriggerRegistry {
        &mut self.registry
    }

    pub fn resolution(&self) -> Resolution {
        self.applier.rules().resolution()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn role(&self, id: &CharacterId) -> Option<Role> {
        self.roles.get(id).copied()
    }

    pub fn fsm(&self, id: &CharacterId) -> Option<&Fsm> {
        self.fsms.get(id)
    }

    /// Registers a character and announces it with `newCharacter`.
    ///
    /// Players get the configured default triggers on top of `triggers` and
    /// start by spawning, as does anyone without a position. Scenery gets no
    /// FSM at all.
    pub fn add_character<S: AsRef<str>>(
        &mut self,
        data: CharacterData,
        role: Role,
        triggers: &[S],
    ) -> Result<()> {
        if self.characters.contains_key(&data.id) {
            return Err(CoreError::DuplicateCharacter(data.id));
        }
        let mut names: Vec<&str> = triggers.iter().map(AsRef::as_ref).collect();
        if role == Role::Player {
            names.extend(self.config.default_player_triggers.iter().map(String::as_str));
        }
        let table = self.registry.build_transition_table(&names)?;

        let character = Character::new(data);
        let id = character.id.clone();
        if role.has_fsm() {
            let initial = if role == Role::Player || !character.is_spawned() {
                StateKind::Spawn { origin: None }
            } else {
                StateKind::Idle
            };
            let intents = match role {
                Role::Player => IntentStrategy::PlayerQueue(VecDeque::new()),
                _ => IntentStrategy::Autonomous,
            };
            let fsm = Fsm::new(self.factory.build(initial, id.clone()), table, intents);
            self.bus.subscribe(&id, fsm.subscriptions());
            self.fsms.insert(id.clone(), fsm);
        }
        self.characters.insert(id.clone(), character);
        self.roles.insert(id.clone(), role);

        tracing::info!(character = %id, %role, "character joined");
        self.emit(GameEvent::NewCharacter {
            character: id,
            character_type: role,
        });
        Ok(())
    }

    /// Drops a character and announces it with `rmCharacter`.
    ///
    /// Returns `false` if nobody by that id was registered.
    pub fn remove_character(&mut self, id: &CharacterId) -> bool {
        if self.characters.remove(id).is_none() {
            return false;
        }
        self.fsms.remove(id);
        self.roles.remove(id);
        self.bus.unsubscribe(id);

        tracing::info!(character = %id, "character left");
        self.emit(GameEvent::RmCharacter {
            character_id: id.clone(),
        });
        true
    }

    /// Queues a player intent.
    ///
    /// Unknown action names are configuration errors. Intents for characters
    /// that are gone, or that do not take intents, are dropped and reported
    /// as `Ok(false)`.
    pub fn handle_player_action(&mut self, action: PlayerAction) -> Result<bool> {
        let Some(fsm) = self.fsms.get_mut(&action.character) else {
            tracing::debug!(character = %action.character, "intent for unknown character dropped");
            return Ok(false);
        };
        if !fsm.accepts_intents() {
            tracing::debug!(character = %action.character, "character does not take intents");
            return Ok(false);
        }
        let state = self
            .factory
            .build_named(&action.action, action.character, action.params)?;
        Ok(fsm.queue_intent(state))
    }

    /// Feeds an inbound event to the subscribed FSMs.
    ///
    /// An inbound `rmCharacter` removes the character first.
    pub fn publish(&mut self, event: GameEvent) {
        match event {
            GameEvent::RmCharacter { character_id } => {
                self.remove_character(&character_id);
            }
            event => self.dispatch(&event),
        }
    }

    /// Buffers a server update for the next client tick.
    pub fn on_character_update(&mut self, update: Update) {
        self.inbound.push_back(update);
    }

    /// Drains the events published since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self) -> Snapshot {
        let characters = self
            .characters
            .values()
            .map(|character| CharacterSnapshot {
                id: character.id.clone(),
                role: self.roles.get(&character.id).copied().unwrap_or_default(),
                position: character.position,
                orientation: character.orientation,
                health: character.health(),
                sheet: character.sheet.clone(),
                state: self.fsms.get(&character.id).map(|fsm| fsm.state().clone()),
            })
            .collect();
        Snapshot {
            map: self.map.clone(),
            characters,
        }
    }

    /// Advances the simulation to `now`.
    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        let mut report = TickReport {
            timestamp: now,
            ..TickReport::default()
        };

        for update in mem::take(&mut self.inbound) {
            self.ingest(update, &mut report);
        }

        for character in self.characters.values_mut() {
            character.update_modifiers(now);
        }

        let mut batch = Vec::new();
        for (id, fsm) in &mut self.fsms {
            if fsm.tick(now, self.characters.get(id), &mut self.factory) {
                tracing::debug!(character = %id, action = %fsm.state().action(), "state activated");
                batch.push(fsm.state().clone());
            }
        }
        report.transitions = batch.len();

        for state in batch {
            if !self.characters.contains_key(&state.owner) {
                continue;
            }
            match self.applier.execute(
                &state,
                now,
                &self.map,
                &mut self.characters,
                &mut *self.rolls,
            ) {
                Ok(updates) => {
                    for update in updates {
                        self.publish_update(update, &mut report);
                    }
                }
                Err(error) => report.failures.push(error),
            }
        }
        report
    }

    fn publish_update(&mut self, update: Update, report: &mut TickReport) {
        self.emit(GameEvent::CharacterUpdate(update.clone()));
        if self.resolution() == Resolution::Authoritative {
            if update.is_lethal() || update.result == UpdateResult::Warp {
                if self.remove_character(&update.character) {
                    report.removed.push(update.character.clone());
                }
            } else if update.result == UpdateResult::Shoot
                && let Some(id) = self.launch_projectile(&update)
            {
                report.spawned.push(id);
            }
        }
        report.updates.push(update);
    }

    /// Applies one buffered server update on the client.
    fn ingest(&mut self, update: Update, report: &mut TickReport) {
        if !self.characters.contains_key(&update.character) {
            let Some(sheet) = update.sheet.clone() else {
                tracing::debug!(character = %update.character, "update for unknown character dropped");
                return;
            };
            let data = CharacterData::new(update.character.clone(), sheet);
            if let Err(error) = self.add_character::<&str>(data, Role::Npc, &[]) {
                tracing::warn!("cannot materialize {}: {error}", update.character);
                return;
            }
        }
        if let Err(error) = applier::apply(&update, &mut self.characters) {
            tracing::warn!("dropping server update: {error}");
            return;
        }
        self.emit(GameEvent::CharacterUpdate(update.clone()));
        report.updates.push(update);
    }

    fn launch_projectile(&mut self, shot: &Update) -> Option<CharacterId> {
        let (Some(position), Some(orientation)) = (shot.position, shot.orientation) else {
            return None;
        };
        self.shots_fired += 1;
        let id = CharacterId::new(format!("{}#shot-{}", shot.character, self.shots_fired));
        let table = match self.registry.build_transition_table(&PROJECTILE_TRIGGERS) {
            Ok(table) => table,
            Err(error) => {
                tracing::warn!(owner = %shot.character, "projectile not launched: {error}");
                return None;
            }
        };

        let projectile =
            Character::projectile(id.clone(), shot.character.clone(), position, orientation);
        let flight = self
            .factory
            .build(StateKind::Walk(Walk::towards(orientation)), id.clone());
        let fsm = Fsm::new(flight, table, IntentStrategy::Autonomous);
        self.bus.subscribe(&id, fsm.subscriptions());
        self.fsms.insert(id.clone(), fsm);
        self.characters.insert(id.clone(), projectile);
        self.roles.insert(id.clone(), Role::Projectile);

        tracing::debug!(owner = %shot.character, projectile = %id, "projectile launched");
        self.emit(GameEvent::NewCharacter {
            character: id.clone(),
            character_type: Role::Projectile,
        });
        Some(id)
    }

    /// Records `event` for the outbox and routes it to local FSMs.
    fn emit(&mut self, event: GameEvent) {
        self.dispatch(&event);
        self.outbox.push(event);
    }

    fn dispatch(&mut self, event: &GameEvent) {
        let recipients = self.bus.recipients(event);
        if recipients.is_empty() {
            tracing::trace!(kind = %event.kind(), "no subscribers");
            return;
        }
        for id in recipients {
            let (Some(fsm), Some(character)) = (self.fsms.get_mut(&id), self.characters.get(&id))
            else {
                continue;
            };
            fsm.handle_event(character, event, &mut self.factory, &mut *self.rolls);
        }
    }
}
