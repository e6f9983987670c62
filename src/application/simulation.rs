//! Seeded random swap runs checked against the pool invariants

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info};

use crate::application::services::PoolService;
use crate::domain::pool::SwapDirection;
use crate::report::SimulationReport;
use crate::shared::errors::AppError;
use crate::shared::types::AccountId;

#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub swaps: u32,
    pub seed: u64,
    /// Upper bound for a single swap input, in smallest units
    pub max_amount: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            swaps: 1_000,
            seed: 42,
            max_amount: 1_000_000,
        }
    }
}

/// Run `params.swaps` random swaps for `trader`, comparing every executed
/// swap with the quote taken just before it and checking that `k` never
/// shrinks.
pub async fn run_simulation(
    service: &PoolService,
    trader: &AccountId,
    params: &SimulationParams,
) -> Result<SimulationReport, AppError> {
    if params.max_amount == 0 {
        return Err(AppError::ConfigError("max amount must be positive".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let (asset1, asset2) = service.asset_ids().await;
    let initial = service.reserves().await;
    let mut report = SimulationReport::new(params.seed, params.swaps, initial);

    info!(
        "Simulating {} swaps (seed {}, max amount {})",
        params.swaps, params.seed, params.max_amount
    );

    for _ in 0..params.swaps {
        let direction = if rng.gen::<bool>() {
            SwapDirection::Forward
        } else {
            SwapDirection::Backward
        };
        let amount = rng.gen_range(1..=params.max_amount);
        let asset_in = match direction {
            SwapDirection::Forward => asset1,
            SwapDirection::Backward => asset2,
        };

        let before = service.reserves().await;
        let quoted = service.quote(&asset_in, amount).await?;

        match service.swap(trader, direction, amount).await {
            Ok(outcome) => {
                report.swaps_executed += 1;
                match direction {
                    SwapDirection::Forward => {
                        report.volume.asset1 = report.volume.asset1.saturating_add(amount);
                        report.fees_retained.asset1 =
                            report.fees_retained.asset1.saturating_add(outcome.fee_retained);
                    }
                    SwapDirection::Backward => {
                        report.volume.asset2 = report.volume.asset2.saturating_add(amount);
                        report.fees_retained.asset2 =
                            report.fees_retained.asset2.saturating_add(outcome.fee_retained);
                    }
                }
                if outcome.amount_out != quoted {
                    report.quote_mismatches += 1;
                }
                if outcome.reserves_after.k() < before.k() {
                    error!(
                        "Invariant violated: k {} -> {}",
                        before.k(),
                        outcome.reserves_after.k()
                    );
                    report.invariant_held = false;
                }
            }
            Err(err) => report.record_rejection(err.kind()),
        }
    }

    let report = report.finish(initial, service.reserves().await);
    info!(
        "Simulation {} done: {} executed, k growth {} bps",
        report.run_id, report.swaps_executed, report.k_growth_bps
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::Session;
    use crate::config::Config;

    async fn seeded_session() -> (Session, AccountId) {
        let session = Session::bootstrap(&Config::default()).unwrap();
        let owner = session.account("owner").unwrap();
        let alice = session.account("alice").unwrap();
        session
            .service
            .add_liquidity(&owner, 50_000_000_000, 25_000_000_000)
            .await
            .unwrap();
        (session, alice)
    }

    #[tokio::test]
    async fn test_simulation_holds_invariant() {
        let (session, alice) = seeded_session().await;
        let params = SimulationParams {
            swaps: 300,
            seed: 9,
            max_amount: 50_000_000,
        };

        let report = run_simulation(&session.service, &alice, &params).await.unwrap();

        assert!(report.invariant_held);
        assert_eq!(report.quote_mismatches, 0);
        assert_eq!(report.swaps_executed, 300);
        assert!(report.k_growth_bps > 0);
        assert!(report.fees_retained.asset1 + report.fees_retained.asset2 > 0);
    }

    #[tokio::test]
    async fn test_simulation_is_deterministic_per_seed() {
        let (first, alice1) = seeded_session().await;
        let (second, alice2) = seeded_session().await;
        let params = SimulationParams {
            swaps: 50,
            seed: 1234,
            max_amount: 10_000_000,
        };

        let a = run_simulation(&first.service, &alice1, &params).await.unwrap();
        let b = run_simulation(&second.service, &alice2, &params).await.unwrap();

        assert_eq!(a.final_state.k, b.final_state.k);
        assert_ne!(a.run_id, b.run_id);
    }

    #[tokio::test]
    async fn test_simulation_on_empty_pool_rejects_everything() {
        let session = Session::bootstrap(&Config::default()).unwrap();
        let alice = session.account("alice").unwrap();
        let params = SimulationParams {
            swaps: 20,
            ..SimulationParams::default()
        };

        let report = run_simulation(&session.service, &alice, &params).await.unwrap();

        assert_eq!(report.swaps_executed, 0);
        assert_eq!(report.rejections.get("insufficient_liquidity"), Some(&20));
    }

    #[tokio::test]
    async fn test_simulation_with_huge_reserves_saturates_totals() {
        let session = Session::bootstrap(&Config::default()).unwrap();
        let owner = session.account("owner").unwrap();
        let trader = AccountId::new_unique();
        let seed = 1_000_000_000_000_000;
        for asset in [&session.asset1, &session.asset2] {
            asset.mint(&owner, seed);
            asset.mint(&trader, u64::MAX / 2);
        }
        session.service.add_liquidity(&owner, seed, seed).await.unwrap();
        let params = SimulationParams {
            swaps: 20_000,
            seed: 3,
            max_amount: 8_000_000_000_000_000_000,
        };

        let report = run_simulation(&session.service, &trader, &params).await.unwrap();

        assert!(report.invariant_held);
        assert_eq!(report.quote_mismatches, 0);
        assert!(report.swaps_executed > 0);
        assert!(report.k_growth_bps > 0);
        assert_eq!(
            report.swaps_executed + report.rejections.values().sum::<u32>(),
            20_000
        );
    }

    #[tokio::test]
    async fn test_zero_max_amount_is_config_error() {
        let (session, alice) = seeded_session().await;
        let params = SimulationParams {
            max_amount: 0,
            ..SimulationParams::default()
        };
        assert!(matches!(
            run_simulation(&session.service, &alice, &params).await,
            Err(AppError::ConfigError(_))
        ));
    }
}
