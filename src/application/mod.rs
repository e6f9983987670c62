//! Application layer - use cases and services

pub mod commands;
pub mod services;
pub mod session;
pub mod simulation;

pub use commands::{Cli, CommandExecutor, Commands};
pub use services::PoolService;
pub use session::Session;
pub use simulation::{run_simulation, SimulationParams};
