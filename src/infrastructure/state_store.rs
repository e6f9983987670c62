//! JSON state file for the CLI: pool snapshot, asset ledgers and account names

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::pool::PoolSnapshot;
use crate::infrastructure::ledger::AssetLedgerSnapshot;
use crate::shared::errors::AppError;
use crate::shared::types::AccountId;

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub pool: PoolSnapshot,
    pub asset1: AssetLedgerSnapshot,
    pub asset2: AssetLedgerSnapshot,
    /// Human-readable names for ledger accounts
    pub accounts: BTreeMap<String, AccountId>,
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<PersistedState, AppError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            AppError::StateError(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let state: PersistedState = serde_json::from_str(&raw).map_err(|e| {
            AppError::StateError(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        if state.version != STATE_VERSION {
            return Err(AppError::StateError(format!(
                "Unsupported state version {} (expected {})",
                state.version, STATE_VERSION
            )));
        }
        debug!("Loaded pool state from {}", self.path.display());
        Ok(state)
    }

    /// Write via a sibling temp file so a crash never leaves a torn state file
    pub fn save(&self, state: &PersistedState) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| AppError::StateError(format!("Failed to encode state: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            AppError::StateError(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::StateError(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;
        debug!("Saved pool state to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pool::Reserves;
    use crate::shared::types::AssetId;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("pairswap-{}.json", uuid::Uuid::new_v4()))
    }

    fn ledger(id: AssetId, custody: AccountId, holder: AccountId) -> AssetLedgerSnapshot {
        AssetLedgerSnapshot {
            id,
            symbol: "TST".to_string(),
            decimals: 6,
            custody,
            balances: BTreeMap::from([(holder, 42), (custody, 1_000)]),
        }
    }

    fn sample() -> PersistedState {
        let custody = AccountId::new_unique();
        let owner = AccountId::new_unique();
        let asset1 = AssetId::new_unique();
        let asset2 = AssetId::new_unique();
        PersistedState {
            version: STATE_VERSION,
            pool: PoolSnapshot {
                address: custody,
                asset1,
                asset2,
                authority: owner,
                reserves: Reserves::new(1_000, 1_000),
            },
            asset1: ledger(asset1, custody, owner),
            asset2: ledger(asset2, custody, owner),
            accounts: BTreeMap::from([("owner".to_string(), owner)]),
        }
    }

    #[test]
    fn test_save_then_load() {
        let store = StateStore::new(temp_path());
        let state = sample();

        store.save(&state).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), state);

        fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_missing_file_is_state_error() {
        let store = StateStore::new(temp_path());
        assert!(matches!(store.load(), Err(AppError::StateError(_))));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let store = StateStore::new(temp_path());
        let mut state = sample();
        state.version = 99;
        store.save(&state).unwrap();

        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("Unsupported state version 99"));

        fs::remove_file(store.path()).unwrap();
    }
}
