//! Reserve/invariant engine for a two-asset constant-product pool

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info, warn};

use super::{
    EventSink, PoolEvent, PoolSnapshot, PoolState, ReentrancyGuard, Reserves, SwapDirection,
    SwapOutcome, Sweep,
};
use crate::domain::asset::FungibleAsset;
use crate::math;
use crate::shared::errors::PoolError;
use crate::shared::types::{AccountId, AssetId};

/// Two-asset constant-product pool.
///
/// Every mutating call validates, prices against the current reserves, moves
/// the external assets, and only then commits the new reserves and emits one
/// [`PoolEvent`]. A failure at any step leaves the reserves untouched and
/// reverses transfers that already went through.
///
/// Methods take `&self`; the reserves sit behind a lock so readers only ever
/// observe committed pairs, and a [`ReentrancyGuard`] keeps asset callbacks
/// from re-entering a mutation in flight.
pub struct Pool {
    address: AccountId,
    asset1: Arc<dyn FungibleAsset>,
    asset2: Arc<dyn FungibleAsset>,
    authority: RwLock<AccountId>,
    reserves: RwLock<Reserves>,
    guard: ReentrancyGuard,
    events: Arc<dyn EventSink>,
}

impl Pool {
    /// Create an empty pool custodied at `address`.
    ///
    /// Fails with `InvalidToken` for a null asset id and `IdenticalAssets`
    /// when both handles refer to the same asset.
    pub fn new(
        address: AccountId,
        asset1: Arc<dyn FungibleAsset>,
        asset2: Arc<dyn FungibleAsset>,
        authority: AccountId,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, PoolError> {
        for asset in [&asset1, &asset2] {
            if asset.id().is_null() {
                return Err(PoolError::InvalidToken(asset.id()));
            }
        }
        if asset1.id() == asset2.id() {
            return Err(PoolError::IdenticalAssets);
        }

        info!(
            "Created pool {} for {}/{} (authority {})",
            address,
            asset1.symbol(),
            asset2.symbol(),
            authority
        );

        Ok(Self {
            address,
            asset1,
            asset2,
            authority: RwLock::new(authority),
            reserves: RwLock::new(Reserves::default()),
            guard: ReentrancyGuard::new(),
            events,
        })
    }

    /// Rebuild a pool from a snapshot around the same asset ledgers
    pub fn restore(
        snapshot: PoolSnapshot,
        asset1: Arc<dyn FungibleAsset>,
        asset2: Arc<dyn FungibleAsset>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, PoolError> {
        if asset1.id() != snapshot.asset1 {
            return Err(PoolError::InvalidToken(asset1.id()));
        }
        if asset2.id() != snapshot.asset2 {
            return Err(PoolError::InvalidToken(asset2.id()));
        }

        let pool = Self::new(snapshot.address, asset1, asset2, snapshot.authority, events)?;
        pool.commit(snapshot.reserves);
        Ok(pool)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            address: self.address,
            asset1: self.asset1.id(),
            asset2: self.asset2.id(),
            authority: self.authority(),
            reserves: self.reserves(),
        }
    }

    pub fn address(&self) -> AccountId {
        self.address
    }

    pub fn asset_ids(&self) -> (AssetId, AssetId) {
        (self.asset1.id(), self.asset2.id())
    }

    pub fn authority(&self) -> AccountId {
        *self.authority.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_authorized(&self, caller: &AccountId) -> bool {
        self.authority() == *caller
    }

    /// Current `(reserve1, reserve2)`, verbatim
    pub fn reserves(&self) -> Reserves {
        *self.reserves.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PoolState {
        PoolState::from_reserves(&self.reserves())
    }

    /// Seed liquidity at any ratio. Authority only.
    pub fn add_liquidity(
        &self,
        caller: &AccountId,
        amount1: u64,
        amount2: u64,
    ) -> Result<Reserves, PoolError> {
        let _entered = self.guard.enter()?;
        self.ensure_authorized(caller)?;
        if amount1 == 0 || amount2 == 0 {
            return Err(PoolError::ZeroAmount);
        }

        let current = self.reserves();
        let next = Reserves::new(
            current.reserve1.checked_add(amount1).ok_or(PoolError::Overflow)?,
            current.reserve2.checked_add(amount2).ok_or(PoolError::Overflow)?,
        );

        let mut transfers = TransferBatch::default();
        transfers.pull(self.asset1.as_ref(), caller, amount1)?;
        transfers.pull(self.asset2.as_ref(), caller, amount2)?;

        self.commit(next);
        info!(
            "Liquidity added by {}: {} {} + {} {} -> reserves ({}, {})",
            caller,
            amount1,
            self.asset1.symbol(),
            amount2,
            self.asset2.symbol(),
            next.reserve1,
            next.reserve2
        );
        self.events.emit(&PoolEvent::LiquidityAdded {
            provider: *caller,
            amount1,
            amount2,
        });

        Ok(next)
    }

    /// Swap asset1 for asset2
    pub fn swap_forward(
        &self,
        caller: &AccountId,
        amount_in: u64,
    ) -> Result<SwapOutcome, PoolError> {
        self.swap(caller, SwapDirection::Forward, amount_in)
    }

    /// Swap asset2 for asset1
    pub fn swap_backward(
        &self,
        caller: &AccountId,
        amount_in: u64,
    ) -> Result<SwapOutcome, PoolError> {
        self.swap(caller, SwapDirection::Backward, amount_in)
    }

    pub fn swap(
        &self,
        caller: &AccountId,
        direction: SwapDirection,
        amount_in: u64,
    ) -> Result<SwapOutcome, PoolError> {
        let _entered = self.guard.enter()?;

        let current = self.reserves();
        let (reserve_in, reserve_out) = current.oriented(direction);
        if reserve_in == 0 || reserve_out == 0 {
            debug!("Rejected {} swap on pool {}: no liquidity", direction.as_str(), self.address);
            return Err(PoolError::InsufficientLiquidity);
        }
        if amount_in == 0 {
            return Err(PoolError::ZeroAmount);
        }

        let amount_out = math::amount_out(amount_in, reserve_in, reserve_out);
        if amount_out == 0 {
            debug!("Rejected {} swap of {}: output rounds to zero", direction.as_str(), amount_in);
            return Err(PoolError::InsufficientAmount);
        }
        if amount_out >= reserve_out {
            return Err(PoolError::InsufficientLiquidity);
        }

        let next = Reserves::from_oriented(
            direction,
            reserve_in.checked_add(amount_in).ok_or(PoolError::Overflow)?,
            reserve_out - amount_out,
        );

        let (asset_in, asset_out) = self.assets_for(direction);
        let mut transfers = TransferBatch::default();
        transfers.pull(asset_in, caller, amount_in)?;
        transfers.push(asset_out, caller, amount_out)?;

        self.commit(next);
        info!(
            "Swap by {}: {} {} -> {} {} (reserves {}, {})",
            caller,
            amount_in,
            asset_in.symbol(),
            amount_out,
            asset_out.symbol(),
            next.reserve1,
            next.reserve2
        );
        self.events.emit(&PoolEvent::TokensSwapped {
            trader: *caller,
            asset_in: asset_in.id(),
            asset_out: asset_out.id(),
            amount_in,
            amount_out,
        });

        Ok(SwapOutcome {
            direction,
            asset_in: asset_in.id(),
            asset_out: asset_out.id(),
            amount_in,
            amount_out,
            fee_retained: math::fee_retained(amount_in),
            reserves_after: next,
        })
    }

    /// Withdraw directly against current reserves. Authority only.
    pub fn remove_liquidity(
        &self,
        caller: &AccountId,
        amount1: u64,
        amount2: u64,
    ) -> Result<Reserves, PoolError> {
        let _entered = self.guard.enter()?;
        self.ensure_authorized(caller)?;
        if amount1 == 0 || amount2 == 0 {
            return Err(PoolError::ZeroAmount);
        }

        let current = self.reserves();
        if amount1 > current.reserve1 || amount2 > current.reserve2 {
            debug!(
                "Rejected withdrawal of ({}, {}) against reserves ({}, {})",
                amount1, amount2, current.reserve1, current.reserve2
            );
            return Err(PoolError::InsufficientLiquidity);
        }
        let next = Reserves::new(current.reserve1 - amount1, current.reserve2 - amount2);

        let mut transfers = TransferBatch::default();
        transfers.push(self.asset1.as_ref(), caller, amount1)?;
        transfers.push(self.asset2.as_ref(), caller, amount2)?;

        self.commit(next);
        info!(
            "Liquidity removed by {}: {} {} + {} {} -> reserves ({}, {})",
            caller,
            amount1,
            self.asset1.symbol(),
            amount2,
            self.asset2.symbol(),
            next.reserve1,
            next.reserve2
        );
        self.events.emit(&PoolEvent::LiquidityRemoved {
            provider: *caller,
            amount1,
            amount2,
        });

        Ok(next)
    }

    /// Best-effort sweep of everything the ledgers say the pool holds.
    ///
    /// Reads real custody balances rather than the reserve counters, does not
    /// abort when a transfer fails, and always resets both reserves to zero.
    pub fn emergency_withdraw(&self, caller: &AccountId) -> Result<Sweep, PoolError> {
        let _entered = self.guard.enter()?;
        self.ensure_authorized(caller)?;

        let sweep = Sweep {
            amount1: self.sweep(self.asset1.as_ref(), caller),
            amount2: self.sweep(self.asset2.as_ref(), caller),
        };
        self.commit(Reserves::default());

        warn!(
            "Emergency withdrawal by {}: swept {} {} and {} {}, reserves reset",
            caller,
            sweep.amount1,
            self.asset1.symbol(),
            sweep.amount2,
            self.asset2.symbol()
        );
        self.events.emit(&PoolEvent::EmergencyWithdrawal {
            recipient: *caller,
            amount1: sweep.amount1,
            amount2: sweep.amount2,
        });

        Ok(sweep)
    }

    /// Hand privileged operations to another account. Authority only.
    pub fn transfer_authority(
        &self,
        caller: &AccountId,
        new_authority: AccountId,
    ) -> Result<(), PoolError> {
        let _entered = self.guard.enter()?;
        self.ensure_authorized(caller)?;

        *self.authority.write().unwrap_or_else(PoisonError::into_inner) = new_authority;
        info!("Pool {} authority transferred: {} -> {}", self.address, caller, new_authority);
        self.events.emit(&PoolEvent::AuthorityTransferred {
            previous: *caller,
            new_authority,
        });

        Ok(())
    }

    /// Price of `asset` in units of the other asset, scaled by 1e18.
    /// Zero while either reserve is empty.
    pub fn spot_price(&self, asset: &AssetId) -> Result<u128, PoolError> {
        let direction = self.direction_for(asset)?;
        let (queried, other) = self.reserves().oriented(direction);
        Ok(math::spot_price(queried, other))
    }

    /// Output a swap of `amount_in` of `asset` would produce right now.
    /// A pure projection: no validation beyond the asset check, no mutation.
    pub fn quote(&self, asset: &AssetId, amount_in: u64) -> Result<u64, PoolError> {
        let direction = self.direction_for(asset)?;
        let (reserve_in, reserve_out) = self.reserves().oriented(direction);
        if amount_in == 0 || reserve_in == 0 || reserve_out == 0 {
            return Ok(0);
        }
        Ok(math::amount_out(amount_in, reserve_in, reserve_out))
    }

    /// Swap direction in which `asset` is the input
    pub fn direction_for(&self, asset: &AssetId) -> Result<SwapDirection, PoolError> {
        if *asset == self.asset1.id() {
            Ok(SwapDirection::Forward)
        } else if *asset == self.asset2.id() {
            Ok(SwapDirection::Backward)
        } else {
            Err(PoolError::InvalidToken(*asset))
        }
    }

    fn assets_for(&self, direction: SwapDirection) -> (&dyn FungibleAsset, &dyn FungibleAsset) {
        match direction {
            SwapDirection::Forward => (self.asset1.as_ref(), self.asset2.as_ref()),
            SwapDirection::Backward => (self.asset2.as_ref(), self.asset1.as_ref()),
        }
    }

    fn ensure_authorized(&self, caller: &AccountId) -> Result<(), PoolError> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            debug!("Rejected privileged call from {}", caller);
            Err(PoolError::Unauthorized(*caller))
        }
    }

    fn commit(&self, next: Reserves) {
        *self.reserves.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn sweep(&self, asset: &dyn FungibleAsset, to: &AccountId) -> u64 {
        let balance = asset.balance_of(&self.address);
        if balance == 0 {
            return 0;
        }
        if asset.transfer_out(to, balance) {
            balance
        } else {
            warn!("Emergency sweep of {} {} to {} failed", balance, asset.symbol(), to);
            0
        }
    }
}

/// Transfers completed so far in one call, so a later failure can undo them
#[derive(Default)]
struct TransferBatch<'a> {
    completed: Vec<Completed<'a>>,
}

struct Completed<'a> {
    asset: &'a dyn FungibleAsset,
    counterparty: AccountId,
    amount: u64,
    inbound: bool,
}

impl<'a> TransferBatch<'a> {
    fn pull(
        &mut self,
        asset: &'a dyn FungibleAsset,
        from: &AccountId,
        amount: u64,
    ) -> Result<(), PoolError> {
        if asset.transfer_in(from, amount) {
            self.record(asset, from, amount, true);
            Ok(())
        } else {
            self.fail(asset, amount)
        }
    }

    fn push(
        &mut self,
        asset: &'a dyn FungibleAsset,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), PoolError> {
        if asset.transfer_out(to, amount) {
            self.record(asset, to, amount, false);
            Ok(())
        } else {
            self.fail(asset, amount)
        }
    }

    fn record(
        &mut self,
        asset: &'a dyn FungibleAsset,
        counterparty: &AccountId,
        amount: u64,
        inbound: bool,
    ) {
        self.completed.push(Completed {
            asset,
            counterparty: *counterparty,
            amount,
            inbound,
        });
    }

    fn fail(&mut self, asset: &dyn FungibleAsset, amount: u64) -> Result<(), PoolError> {
        warn!(
            "Transfer of {} {} failed, reverting {} earlier transfer(s)",
            amount,
            asset.symbol(),
            self.completed.len()
        );
        while let Some(done) = self.completed.pop() {
            let reverted = if done.inbound {
                done.asset.transfer_out(&done.counterparty, done.amount)
            } else {
                done.asset.transfer_in(&done.counterparty, done.amount)
            };
            if !reverted {
                error!(
                    "Could not revert transfer of {} {} with {}",
                    done.amount,
                    done.asset.symbol(),
                    done.counterparty
                );
            }
        }
        Err(PoolError::TransferFailed {
            asset: asset.id(),
            amount,
        })
    }
}
