//! Simulation worker that owns the authoritative engine.
//!
//! Processes commands sequentially and republishes whatever the engine emits
//! after each one, so subscribers observe events in engine order.

use tokio::sync::{mpsc, oneshot};

use skirmish_core::{
    CharacterData, CharacterId, GameEngine, GameEvent, PlayerAction, Role, Snapshot, TickReport,
    Timestamp, Update,
};

use crate::api::Result;
use crate::events::{Event, EventBus};

/// Commands that can be sent to the simulation worker.
pub enum Command {
    AddCharacter {
        data: CharacterData,
        role: Role,
        triggers: Vec<String>,
        reply: oneshot::Sender<Result<()>>,
    },
    RemoveCharacter {
        id: CharacterId,
        reply: oneshot::Sender<bool>,
    },
    PlayerAction {
        action: PlayerAction,
        reply: oneshot::Sender<Result<bool>>,
    },
    /// Inject an event into the engine's own bus.
    Publish {
        event: GameEvent,
        reply: oneshot::Sender<()>,
    },
    /// Apply an update received from an authoritative peer.
    IngestUpdate {
        update: Update,
        reply: oneshot::Sender<()>,
    },
    Tick {
        timestamp: Timestamp,
        reply: oneshot::Sender<TickReport>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
}

/// Background worker that drives a [`GameEngine`].
pub struct SimulationWorker {
    engine: GameEngine,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl SimulationWorker {
    pub fn new(
        engine: GameEngine,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        tracing::info!(
            resolution = %engine.resolution(),
            characters = engine.characters().count(),
            "simulation worker starting"
        );
        Self {
            engine,
            command_rx,
            event_bus,
        }
    }

    /// Run until every command sender is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd);
                    self.flush_events();
                }
                else => break,
            }
        }
        tracing::info!("simulation worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::AddCharacter {
                data,
                role,
                triggers,
                reply,
            } => {
                let result = self
                    .engine
                    .add_character(data, role, &triggers)
                    .map_err(Into::into);
                if reply.send(result).is_err() {
                    tracing::debug!("AddCharacter reply channel closed (caller dropped)");
                }
            }
            Command::RemoveCharacter { id, reply } => {
                let removed = self.engine.remove_character(&id);
                if reply.send(removed).is_err() {
                    tracing::debug!("RemoveCharacter reply channel closed (caller dropped)");
                }
            }
            Command::PlayerAction { action, reply } => {
                let result = self.engine.handle_player_action(action).map_err(Into::into);
                if reply.send(result).is_err() {
                    tracing::debug!("PlayerAction reply channel closed (caller dropped)");
                }
            }
            Command::Publish { event, reply } => {
                // Signals never reach the outbox, so observers get them here.
                if let GameEvent::Signal { name } = &event {
                    self.event_bus.publish(Event::Signal(name.clone()));
                }
                self.engine.publish(event);
                if reply.send(()).is_err() {
                    tracing::debug!("Publish reply channel closed (caller dropped)");
                }
            }
            Command::IngestUpdate { update, reply } => {
                self.engine.on_character_update(update);
                if reply.send(()).is_err() {
                    tracing::debug!("IngestUpdate reply channel closed (caller dropped)");
                }
            }
            Command::Tick { timestamp, reply } => {
                let report = self.engine.tick(timestamp);
                tracing::trace!(
                    timestamp = timestamp.millis(),
                    transitions = report.transitions,
                    updates = report.updates.len(),
                    "tick complete"
                );
                if reply.send(report).is_err() {
                    tracing::debug!("Tick reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                if reply.send(self.engine.snapshot()).is_err() {
                    tracing::debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn flush_events(&mut self) {
        for event in self.engine.take_events() {
            self.event_bus.publish(Event::from(event));
        }
    }
}
