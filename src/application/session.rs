//! A pool together with its asset ledgers and named accounts

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::application::services::PoolService;
use crate::config::Config;
use crate::domain::asset::FungibleAsset;
use crate::domain::pool::{EventSink, Pool, PoolEvent};
use crate::infrastructure::events::{FanoutEventSink, RecordingEventSink, TracingEventSink};
use crate::infrastructure::ledger::InMemoryAsset;
use crate::infrastructure::state_store::{PersistedState, STATE_VERSION};
use crate::shared::errors::AppError;
use crate::shared::types::{AccountId, AssetId};

pub struct Session {
    pub service: PoolService,
    pub asset1: Arc<InMemoryAsset>,
    pub asset2: Arc<InMemoryAsset>,
    pub accounts: BTreeMap<String, AccountId>,
    recorder: Arc<RecordingEventSink>,
}

impl Session {
    /// Fresh pool with zero reserves, accounts funded per the config
    pub fn bootstrap(config: &Config) -> Result<Self, AppError> {
        config.validate()?;

        let address = AccountId::new_unique();
        let asset1 = Arc::new(InMemoryAsset::new(
            config.assets[0].symbol.clone(),
            config.assets[0].decimals,
            address,
        ));
        let asset2 = Arc::new(InMemoryAsset::new(
            config.assets[1].symbol.clone(),
            config.assets[1].decimals,
            address,
        ));

        let mut accounts = BTreeMap::new();
        for account in &config.accounts {
            let id = AccountId::new_unique();
            asset1.mint(&id, account.balance1);
            asset2.mint(&id, account.balance2);
            accounts.insert(account.name.clone(), id);
        }
        let authority = accounts
            .get(&config.pool.authority)
            .copied()
            .ok_or_else(|| AppError::UnknownAccount(config.pool.authority.clone()))?;

        let recorder = Arc::new(RecordingEventSink::new());
        let pool = Pool::new(
            address,
            asset1.clone(),
            asset2.clone(),
            authority,
            Self::sink(&recorder),
        )?;
        info!(
            "Bootstrapped {}/{} pool with {} account(s)",
            asset1.symbol(),
            asset2.symbol(),
            accounts.len()
        );

        Ok(Self {
            service: PoolService::new(pool),
            asset1,
            asset2,
            accounts,
            recorder,
        })
    }

    pub fn from_state(state: PersistedState) -> Result<Self, AppError> {
        let asset1 = Arc::new(InMemoryAsset::from_snapshot(state.asset1));
        let asset2 = Arc::new(InMemoryAsset::from_snapshot(state.asset2));
        let recorder = Arc::new(RecordingEventSink::new());
        let pool = Pool::restore(
            state.pool,
            asset1.clone(),
            asset2.clone(),
            Self::sink(&recorder),
        )?;

        Ok(Self {
            service: PoolService::new(pool),
            asset1,
            asset2,
            accounts: state.accounts,
            recorder,
        })
    }

    pub async fn to_state(&self) -> PersistedState {
        PersistedState {
            version: STATE_VERSION,
            pool: self.service.snapshot().await,
            asset1: self.asset1.snapshot(),
            asset2: self.asset2.snapshot(),
            accounts: self.accounts.clone(),
        }
    }

    /// Resolve an account by name, falling back to a base58 id
    pub fn account(&self, name: &str) -> Result<AccountId, AppError> {
        if let Some(id) = self.accounts.get(name) {
            return Ok(*id);
        }
        name.parse()
            .map_err(|_| AppError::UnknownAccount(name.to_string()))
    }

    /// Resolve an asset by symbol (case-insensitive) or base58 id. Ids that
    /// are not part of the pool are passed through so the pool can reject them.
    pub fn asset(&self, symbol: &str) -> Result<AssetId, AppError> {
        for asset in [&self.asset1, &self.asset2] {
            if asset.symbol().eq_ignore_ascii_case(symbol) {
                return Ok(asset.id());
            }
        }
        symbol
            .parse()
            .map_err(|_| AppError::UnknownAsset(symbol.to_string()))
    }

    pub fn ledger(&self, asset: &AssetId) -> Option<&InMemoryAsset> {
        [&self.asset1, &self.asset2]
            .into_iter()
            .find(|ledger| ledger.id() == *asset)
            .map(|ledger| &**ledger)
    }

    /// Events emitted since the last call
    pub fn take_events(&self) -> Vec<PoolEvent> {
        self.recorder.drain()
    }

    fn sink(recorder: &Arc<RecordingEventSink>) -> Arc<dyn EventSink> {
        Arc::new(
            FanoutEventSink::new()
                .with(Arc::new(TracingEventSink))
                .with(recorder.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pool::{PoolState, Reserves};

    #[tokio::test]
    async fn test_bootstrap_funds_accounts() {
        let session = Session::bootstrap(&Config::default()).unwrap();
        let owner = session.account("owner").unwrap();

        assert_eq!(session.asset1.balance_of(&owner), 1_000_000_000_000);
        assert_eq!(session.service.state().await, PoolState::Empty);
        assert_eq!(session.asset("alpha").unwrap(), session.asset1.id());
        assert!(matches!(session.account("nobody"), Err(AppError::UnknownAccount(_))));
        assert!(matches!(session.asset("GAMMA"), Err(AppError::UnknownAsset(_))));
    }

    #[tokio::test]
    async fn test_state_roundtrip_preserves_pool_and_balances() {
        let session = Session::bootstrap(&Config::default()).unwrap();
        let owner = session.account("owner").unwrap();
        session.service.add_liquidity(&owner, 5_000, 8_000).await.unwrap();
        assert!(matches!(
            session.take_events().as_slice(),
            [PoolEvent::LiquidityAdded { amount1: 5_000, .. }]
        ));

        let state = session.to_state().await;
        let restored = Session::from_state(state.clone()).unwrap();

        assert_eq!(restored.service.reserves().await, Reserves::new(5_000, 8_000));
        assert_eq!(restored.asset2.balance_of(&owner), session.asset2.balance_of(&owner));
        assert_eq!(restored.to_state().await, state);
        assert!(restored.take_events().is_empty());
    }

    #[test]
    fn test_account_by_base58() {
        let session = Session::bootstrap(&Config::default()).unwrap();
        let outsider = AccountId::new_unique();
        assert_eq!(session.account(&outsider.to_string()).unwrap(), outsider);
        let foreign = AssetId::new_unique();
        assert_eq!(session.asset(&foreign.to_string()).unwrap(), foreign);
        assert!(session.ledger(&foreign).is_none());
    }
}
