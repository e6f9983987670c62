//! Pairswap - two-asset constant-product liquidity pool
//! Built with Domain-Driven Design principles

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod math;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::PoolService;
pub use domain::asset::FungibleAsset;
pub use domain::pool::{Pool, PoolEvent, PoolState, Reserves, SwapDirection};
pub use infrastructure::InMemoryAsset;
pub use shared::errors::{AppError, PoolError};
