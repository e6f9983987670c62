//! Pool domain - the two-asset constant-product reserve engine

mod events;
mod pool_engine;
mod reentrancy;

pub use events::{EventSink, PoolEvent};
pub use pool_engine::Pool;
pub use reentrancy::{Entered, ReentrancyGuard};

use serde::{Deserialize, Serialize};

use crate::math;
use crate::shared::types::{AccountId, AssetId};

/// The pool's belief about what it custodies, in smallest units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve1: u64,
    pub reserve2: u64,
}

impl Reserves {
    pub fn new(reserve1: u64, reserve2: u64) -> Self {
        Self { reserve1, reserve2 }
    }

    /// Constant product `reserve1 * reserve2`
    pub fn k(&self) -> u128 {
        math::invariant(self.reserve1, self.reserve2)
    }

    pub fn is_empty(&self) -> bool {
        self.reserve1 == 0 && self.reserve2 == 0
    }

    /// Both sides strictly positive
    pub fn is_active(&self) -> bool {
        self.reserve1 > 0 && self.reserve2 > 0
    }

    /// `(reserve_in, reserve_out)` for a swap direction
    pub fn oriented(&self, direction: SwapDirection) -> (u64, u64) {
        match direction {
            SwapDirection::Forward => (self.reserve1, self.reserve2),
            SwapDirection::Backward => (self.reserve2, self.reserve1),
        }
    }

    pub fn from_oriented(direction: SwapDirection, reserve_in: u64, reserve_out: u64) -> Self {
        match direction {
            SwapDirection::Forward => Self::new(reserve_in, reserve_out),
            SwapDirection::Backward => Self::new(reserve_out, reserve_in),
        }
    }
}

/// Observable macro-state derived from the reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolState {
    /// Both reserves zero; only seeding and queries are meaningful
    Empty,
    /// Both reserves positive
    Active,
    /// Exactly one reserve is zero, reachable by an uneven withdrawal.
    /// Swaps and withdrawals are rejected until the pool is re-seeded.
    Depleted,
}

impl PoolState {
    pub fn from_reserves(reserves: &Reserves) -> Self {
        if reserves.is_empty() {
            PoolState::Empty
        } else if reserves.is_active() {
            PoolState::Active
        } else {
            PoolState::Depleted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolState::Empty => "empty",
            PoolState::Active => "active",
            PoolState::Depleted => "depleted",
        }
    }
}

/// Which way a swap moves value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapDirection {
    /// asset1 in, asset2 out
    Forward,
    /// asset2 in, asset1 out
    Backward,
}

impl SwapDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapDirection::Forward => "forward",
            SwapDirection::Backward => "backward",
        }
    }
}

/// Result of a committed swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub direction: SwapDirection,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub amount_in: u64,
    pub amount_out: u64,
    /// Part of `amount_in` excluded from pricing and kept in the pool
    pub fee_retained: u64,
    pub reserves_after: Reserves,
}

/// Amounts actually swept by an emergency withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sweep {
    pub amount1: u64,
    pub amount2: u64,
}

/// Everything needed to rebuild a pool around the same asset ledgers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub address: AccountId,
    pub asset1: AssetId,
    pub asset2: AssetId,
    pub authority: AccountId,
    pub reserves: Reserves,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_reserves() {
        assert_eq!(PoolState::from_reserves(&Reserves::default()), PoolState::Empty);
        assert_eq!(PoolState::from_reserves(&Reserves::new(1, 1)), PoolState::Active);
        assert_eq!(PoolState::from_reserves(&Reserves::new(0, 5)), PoolState::Depleted);
    }

    #[test]
    fn test_orientation() {
        let reserves = Reserves::new(10, 20);
        assert_eq!(reserves.oriented(SwapDirection::Forward), (10, 20));
        assert_eq!(reserves.oriented(SwapDirection::Backward), (20, 10));
        assert_eq!(Reserves::from_oriented(SwapDirection::Backward, 20, 10), reserves);
    }
}
