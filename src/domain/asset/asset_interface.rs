//! Fungible asset interface

use crate::shared::types::{AccountId, AssetId};

/// Ledger contract for one fungible asset, as seen by a pool.
///
/// Each implementation knows the pool's custody account; "in" and "out" are
/// relative to that account. Transfers report success with a boolean and must
/// leave balances untouched when they return `false`.
pub trait FungibleAsset: Send + Sync {
    fn id(&self) -> AssetId;

    fn symbol(&self) -> &str;

    fn decimals(&self) -> u8;

    /// Move `amount` from `from` into pool custody
    fn transfer_in(&self, from: &AccountId, amount: u64) -> bool;

    /// Move `amount` from pool custody to `to`
    fn transfer_out(&self, to: &AccountId, amount: u64) -> bool;

    fn balance_of(&self, holder: &AccountId) -> u64;
}
