//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker executes engine commands, while the optional ticker
//! drives it from the wall clock.

mod simulation;
mod ticker;

pub use simulation::{Command, SimulationWorker};
pub use ticker::TickerWorker;
