//! Application services and use cases

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::pool::{
    Pool, PoolSnapshot, PoolState, Reserves, SwapDirection, SwapOutcome, Sweep,
};
use crate::shared::errors::PoolError;
use crate::shared::types::{AccountId, AssetId};

/// Async facade that serializes every call on one pool.
///
/// Concurrent callers queue on the mutex, so each operation runs to commit or
/// abort before the next one starts.
#[derive(Clone)]
pub struct PoolService {
    pool: Arc<Mutex<Pool>>,
}

impl PoolService {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool: Arc::new(Mutex::new(pool)),
        }
    }

    pub async fn add_liquidity(
        &self,
        caller: &AccountId,
        amount1: u64,
        amount2: u64,
    ) -> Result<Reserves, PoolError> {
        self.pool.lock().await.add_liquidity(caller, amount1, amount2)
    }

    pub async fn remove_liquidity(
        &self,
        caller: &AccountId,
        amount1: u64,
        amount2: u64,
    ) -> Result<Reserves, PoolError> {
        self.pool.lock().await.remove_liquidity(caller, amount1, amount2)
    }

    pub async fn swap(
        &self,
        caller: &AccountId,
        direction: SwapDirection,
        amount_in: u64,
    ) -> Result<SwapOutcome, PoolError> {
        self.pool.lock().await.swap(caller, direction, amount_in)
    }

    pub async fn emergency_withdraw(&self, caller: &AccountId) -> Result<Sweep, PoolError> {
        self.pool.lock().await.emergency_withdraw(caller)
    }

    pub async fn transfer_authority(
        &self,
        caller: &AccountId,
        new_authority: AccountId,
    ) -> Result<(), PoolError> {
        self.pool.lock().await.transfer_authority(caller, new_authority)
    }

    pub async fn quote(&self, asset: &AssetId, amount_in: u64) -> Result<u64, PoolError> {
        self.pool.lock().await.quote(asset, amount_in)
    }

    pub async fn spot_price(&self, asset: &AssetId) -> Result<u128, PoolError> {
        self.pool.lock().await.spot_price(asset)
    }

    pub async fn reserves(&self) -> Reserves {
        self.pool.lock().await.reserves()
    }

    pub async fn state(&self) -> PoolState {
        self.pool.lock().await.state()
    }

    pub async fn asset_ids(&self) -> (AssetId, AssetId) {
        self.pool.lock().await.asset_ids()
    }

    pub async fn snapshot(&self) -> PoolSnapshot {
        self.pool.lock().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::FungibleAsset;
    use crate::infrastructure::events::RecordingEventSink;
    use crate::infrastructure::ledger::InMemoryAsset;

    #[tokio::test]
    async fn test_concurrent_swaps_are_serialized() {
        let address = AccountId::new_unique();
        let owner = AccountId::new_unique();
        let asset1 = Arc::new(InMemoryAsset::new("AAA", 6, address));
        let asset2 = Arc::new(InMemoryAsset::new("BBB", 6, address));
        asset1.mint(&owner, 10_000_000);
        asset2.mint(&owner, 10_000_000);

        let traders: Vec<AccountId> = (0..8).map(|_| AccountId::new_unique()).collect();
        for trader in &traders {
            asset1.mint(trader, 1_000_000);
            asset2.mint(trader, 1_000_000);
        }

        let events = Arc::new(RecordingEventSink::new());
        let pool =
            Pool::new(address, asset1.clone(), asset2.clone(), owner, events.clone()).unwrap();
        let service = PoolService::new(pool);
        service.add_liquidity(&owner, 5_000_000, 5_000_000).await.unwrap();

        let mut handles = Vec::new();
        for (i, trader) in traders.iter().enumerate() {
            let service = service.clone();
            let trader = *trader;
            handles.push(tokio::spawn(async move {
                let direction = if i % 2 == 0 {
                    SwapDirection::Forward
                } else {
                    SwapDirection::Backward
                };
                for _ in 0..10 {
                    let before = service.reserves().await;
                    service.swap(&trader, direction, 10_000).await.unwrap();
                    assert!(service.reserves().await.k() >= before.k());
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // reserves match custody exactly once every swap has committed
        let reserves = service.reserves().await;
        assert_eq!(asset1.balance_of(&address), reserves.reserve1);
        assert_eq!(asset2.balance_of(&address), reserves.reserve2);
        assert_eq!(asset1.total_supply(), 10_000_000 + 8 * 1_000_000);
        assert_eq!(events.events().len(), 1 + 8 * 10);
    }

    #[tokio::test]
    async fn test_service_queries() {
        let address = AccountId::new_unique();
        let owner = AccountId::new_unique();
        let asset1 = Arc::new(InMemoryAsset::new("AAA", 6, address));
        let asset2 = Arc::new(InMemoryAsset::new("BBB", 6, address));
        asset1.mint(&owner, 1_000);
        asset2.mint(&owner, 1_000);
        let pool = Pool::new(
            address,
            asset1.clone(),
            asset2.clone(),
            owner,
            Arc::new(RecordingEventSink::new()),
        )
        .unwrap();
        let service = PoolService::new(pool);

        assert_eq!(service.state().await, PoolState::Empty);
        service.add_liquidity(&owner, 1_000, 1_000).await.unwrap();
        assert_eq!(service.quote(&asset1.id(), 100).await, Ok(90));
        assert_eq!(service.asset_ids().await, (asset1.id(), asset2.id()));
        assert_eq!(service.snapshot().await.reserves, Reserves::new(1_000, 1_000));

        let next = AccountId::new_unique();
        service.transfer_authority(&owner, next).await.unwrap();
        assert_eq!(
            service.remove_liquidity(&owner, 1, 1).await,
            Err(PoolError::Unauthorized(owner))
        );
        assert_eq!(
            service.emergency_withdraw(&next).await,
            Ok(Sweep { amount1: 1_000, amount2: 1_000 })
        );
        assert_eq!(service.reserves().await, Reserves::default());
    }
}
