//! Pool notifications

use serde::{Deserialize, Serialize};

use crate::shared::types::{AccountId, AssetId};

/// One event per successful state-mutating call; none on failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    LiquidityAdded {
        provider: AccountId,
        amount1: u64,
        amount2: u64,
    },
    LiquidityRemoved {
        provider: AccountId,
        amount1: u64,
        amount2: u64,
    },
    TokensSwapped {
        trader: AccountId,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: u64,
        amount_out: u64,
    },
    EmergencyWithdrawal {
        recipient: AccountId,
        amount1: u64,
        amount2: u64,
    },
    AuthorityTransferred {
        previous: AccountId,
        new_authority: AccountId,
    },
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::LiquidityAdded { .. } => "LiquidityAdded",
            PoolEvent::LiquidityRemoved { .. } => "LiquidityRemoved",
            PoolEvent::TokensSwapped { .. } => "TokensSwapped",
            PoolEvent::EmergencyWithdrawal { .. } => "EmergencyWithdrawal",
            PoolEvent::AuthorityTransferred { .. } => "AuthorityTransferred",
        }
    }
}

/// Receiver of pool notifications
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PoolEvent);
}
