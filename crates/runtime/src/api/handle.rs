//! Client-facing handle for interacting with the runtime.
//!
//! Wraps channels to the simulation worker and exposes async helpers for
//! issuing commands and subscribing to runtime events.
use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};

use skirmish_core::{
    CharacterData, CharacterId, GameEvent, PlayerAction, Role, Snapshot, TickReport, Timestamp,
    Update,
};

use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Cloneable façade for issuing commands to the runtime.
///
/// The simulation worker stops once every handle is dropped.
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Add a character with the named triggers.
    pub async fn add_character<S: AsRef<str>>(
        &self,
        data: CharacterData,
        role: Role,
        triggers: &[S],
    ) -> Result<()> {
        let triggers = triggers.iter().map(|name| name.as_ref().to_owned()).collect();
        self.request(|reply| Command::AddCharacter {
            data,
            role,
            triggers,
            reply,
        })
        .await?
    }

    /// Remove a character; `false` if it was unknown.
    pub async fn remove_character(&self, id: impl Into<CharacterId>) -> Result<bool> {
        let id = id.into();
        self.request(|reply| Command::RemoveCharacter { id, reply })
            .await
    }

    /// Queue a player's intent; `false` if the engine ignored it.
    pub async fn player_action(&self, action: PlayerAction) -> Result<bool> {
        self.request(|reply| Command::PlayerAction { action, reply })
            .await?
    }

    /// Inject an event into the simulation's bus.
    pub async fn publish(&self, event: GameEvent) -> Result<()> {
        self.request(|reply| Command::Publish { event, reply })
            .await
    }

    /// Hand an authoritative update to a predictive engine.
    pub async fn ingest_update(&self, update: Update) -> Result<()> {
        self.request(|reply| Command::IngestUpdate { update, reply })
            .await
    }

    /// Advance the simulation to `timestamp`.
    pub async fn tick(&self, timestamp: Timestamp) -> Result<TickReport> {
        self.request(|reply| Command::Tick { timestamp, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribe to a specific event topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple event topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get the event bus
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
