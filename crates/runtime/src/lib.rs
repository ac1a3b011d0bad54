//! Runtime orchestration for the skirmish simulation.
//!
//! This crate hosts a [`skirmish_core::GameEngine`] on a background worker and
//! republishes what it emits on a topic-based event bus. Consumers embed
//! [`Runtime`] to drive ticks, subscribe to events, and interact with the
//! world through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod runtime;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use events::{Event, EventBus, Topic};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
