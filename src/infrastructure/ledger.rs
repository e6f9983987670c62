//! In-memory fungible asset ledger

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::domain::asset::FungibleAsset;
use crate::shared::types::{AccountId, AssetId, Token};

/// Balance book for one asset, with the pool's custody account baked in.
///
/// `set_fail_transfers(true)` makes every transfer report failure without
/// touching balances, which is how tests exercise the abort paths.
pub struct InMemoryAsset {
    id: AssetId,
    symbol: String,
    decimals: u8,
    custody: AccountId,
    balances: Mutex<HashMap<AccountId, u64>>,
    fail_transfers: AtomicBool,
}

/// Serializable view of an [`InMemoryAsset`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLedgerSnapshot {
    pub id: AssetId,
    pub symbol: String,
    pub decimals: u8,
    pub custody: AccountId,
    pub balances: BTreeMap<AccountId, u64>,
}

impl InMemoryAsset {
    pub fn new(symbol: impl Into<String>, decimals: u8, custody: AccountId) -> Self {
        Self::with_id(AssetId::new_unique(), symbol, decimals, custody)
    }

    pub fn with_id(
        id: AssetId,
        symbol: impl Into<String>,
        decimals: u8,
        custody: AccountId,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            decimals,
            custody,
            balances: Mutex::new(HashMap::new()),
            fail_transfers: AtomicBool::new(false),
        }
    }

    pub fn from_snapshot(snapshot: AssetLedgerSnapshot) -> Self {
        let asset = Self::with_id(
            snapshot.id,
            snapshot.symbol,
            snapshot.decimals,
            snapshot.custody,
        );
        asset.book().extend(snapshot.balances);
        asset
    }

    pub fn snapshot(&self) -> AssetLedgerSnapshot {
        AssetLedgerSnapshot {
            id: self.id,
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            custody: self.custody,
            balances: self
                .book()
                .iter()
                .filter(|(_, balance)| **balance > 0)
                .map(|(holder, balance)| (*holder, *balance))
                .collect(),
        }
    }

    pub fn token(&self) -> Token {
        Token::new(self.id, self.symbol.clone(), self.decimals)
    }

    pub fn custody(&self) -> AccountId {
        self.custody
    }

    /// Credit `amount` out of thin air
    pub fn mint(&self, holder: &AccountId, amount: u64) {
        let mut book = self.book();
        let balance = book.entry(*holder).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn set_fail_transfers(&self, fail: bool) {
        self.fail_transfers.store(fail, Ordering::SeqCst);
    }

    /// Sum of all balances, custody included
    pub fn total_supply(&self) -> u128 {
        self.book().values().map(|balance| *balance as u128).sum()
    }

    fn book(&self) -> MutexGuard<'_, HashMap<AccountId, u64>> {
        self.balances.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> bool {
        if self.fail_transfers.load(Ordering::SeqCst) {
            debug!("{} transfer of {} rejected: transfers disabled", self.symbol, amount);
            return false;
        }

        let mut book = self.book();
        let available = book.get(from).copied().unwrap_or(0);
        if available < amount {
            debug!(
                "{} transfer of {} from {} rejected: balance {}",
                self.symbol, amount, from, available
            );
            return false;
        }
        let credited = book.get(to).copied().unwrap_or(0);
        if from != to && credited.checked_add(amount).is_none() {
            return false;
        }

        book.insert(*from, available - amount);
        let balance = book.entry(*to).or_insert(0);
        *balance += amount;
        true
    }
}

impl FungibleAsset for InMemoryAsset {
    fn id(&self) -> AssetId {
        self.id
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn transfer_in(&self, from: &AccountId, amount: u64) -> bool {
        self.transfer(from, &self.custody, amount)
    }

    fn transfer_out(&self, to: &AccountId, amount: u64) -> bool {
        self.transfer(&self.custody, to, amount)
    }

    fn balance_of(&self, holder: &AccountId) -> u64 {
        self.book().get(holder).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> (InMemoryAsset, AccountId, AccountId) {
        let custody = AccountId::new_unique();
        let holder = AccountId::new_unique();
        let asset = InMemoryAsset::new("TST", 9, custody);
        asset.mint(&holder, 1_000);
        (asset, custody, holder)
    }

    #[test]
    fn test_transfer_in_and_out() {
        let (asset, custody, holder) = asset();

        assert!(asset.transfer_in(&holder, 400));
        assert_eq!(asset.balance_of(&holder), 600);
        assert_eq!(asset.balance_of(&custody), 400);

        assert!(asset.transfer_out(&holder, 150));
        assert_eq!(asset.balance_of(&holder), 750);
        assert_eq!(asset.balance_of(&custody), 250);
        assert_eq!(asset.total_supply(), 1_000);
    }

    #[test]
    fn test_insufficient_balance_fails_cleanly() {
        let (asset, custody, holder) = asset();
        assert!(!asset.transfer_in(&holder, 1_001));
        assert!(!asset.transfer_out(&holder, 1));
        assert_eq!(asset.balance_of(&holder), 1_000);
        assert_eq!(asset.balance_of(&custody), 0);
    }

    #[test]
    fn test_failure_injection() {
        let (asset, _, holder) = asset();
        asset.set_fail_transfers(true);
        assert!(!asset.transfer_in(&holder, 1));
        asset.set_fail_transfers(false);
        assert!(asset.transfer_in(&holder, 1));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let (asset, custody, holder) = asset();
        assert!(asset.transfer_in(&holder, 1_000));

        let snapshot = asset.snapshot();
        // drained accounts are not persisted
        assert!(!snapshot.balances.contains_key(&holder));
        assert_eq!(snapshot.balances.get(&custody), Some(&1_000));

        let restored = InMemoryAsset::from_snapshot(snapshot.clone());
        assert_eq!(restored.id(), asset.id());
        assert_eq!(restored.snapshot(), snapshot);
    }
}
