//! Domain layer - core business logic and entities

pub mod asset;
pub mod pool;
