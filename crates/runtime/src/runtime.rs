//! High-level runtime orchestrator.
//!
//! The runtime owns background workers, wires up command/event channels, and
//! exposes a builder-based API for clients to drive the simulation.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use skirmish_core::{EngineConfig, GameEngine, Resolution, RollSource, TriggerRegistry, WorldMap};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::workers::{SimulationWorker, TickerWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub resolution: Resolution,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Tick automatically at this period; `None` leaves ticking to the caller.
    pub tick_interval: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            resolution: Resolution::Authoritative,
            event_buffer_size: 100,
            command_buffer_size: 32,
            tick_interval: None,
        }
    }
}

/// Main runtime that orchestrates the simulation
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    sim_worker_handle: JoinHandle<()>,
    ticker_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// Handles cloned from this runtime must be dropped first, otherwise the
    /// simulation worker keeps waiting for their commands.
    pub async fn shutdown(self) -> Result<()> {
        if let Some(ticker) = self.ticker_handle {
            ticker.abort();
            if let Err(error) = ticker.await
                && !error.is_cancelled()
            {
                return Err(RuntimeError::WorkerJoin(error));
            }
        }

        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    map: WorldMap,
    registry: Option<TriggerRegistry>,
    rolls: Option<Box<dyn RollSource + Send>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            map: WorldMap::default(),
            registry: None,
            rolls: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Map the simulation runs on
    pub fn map(mut self, map: WorldMap) -> Self {
        self.map = map;
        self
    }

    /// Replace the standard trigger registry
    pub fn registry(mut self, registry: TriggerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the seeded random source
    pub fn rolls(mut self, rolls: Box<dyn RollSource + Send>) -> Self {
        self.rolls = Some(rolls);
        self
    }

    /// Spawn the workers. Must be called within a tokio runtime.
    pub fn build(self) -> Runtime {
        let RuntimeBuilder {
            config,
            map,
            registry,
            rolls,
        } = self;

        let mut engine = GameEngine::new(config.resolution, config.engine, map);
        if let Some(registry) = registry {
            engine = engine.with_registry(registry);
        }
        if let Some(rolls) = rolls {
            engine = engine.with_rolls(rolls);
        }

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size);
        let event_bus = EventBus::with_capacity(config.event_buffer_size);

        let worker = SimulationWorker::new(engine, command_rx, event_bus.clone());
        let sim_worker_handle = tokio::spawn(worker.run());

        let ticker_handle = config.tick_interval.map(|period| {
            tracing::info!(?period, "starting ticker");
            tokio::spawn(TickerWorker::new(command_tx.clone(), period).run())
        });

        Runtime {
            handle: RuntimeHandle::new(command_tx, event_bus),
            sim_worker_handle,
            ticker_handle,
        }
    }
}
