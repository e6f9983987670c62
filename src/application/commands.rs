//! CLI commands and handlers
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::app::AppCfg;
use crate::application::session::Session;
use crate::application::simulation::{run_simulation, SimulationParams};
use crate::domain::asset::FungibleAsset;
use crate::domain::pool::{PoolEvent, SwapDirection};
use crate::infrastructure::state_store::StateStore;
use crate::shared::errors::AppError;
use crate::shared::types::AccountId;
use crate::shared::utils::{format_amount, format_price};

#[derive(Parser, Debug)]
#[command(name = "pairswap")]
#[command(version, about = "Two-asset constant-product pool with a local JSON ledger")]
pub struct Cli {
    /// Path to a Pool.toml config file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Path to the JSON state file (overrides config)
    #[arg(long, global = true)]
    pub state: Option<String>,

    /// Tracing filter, e.g. "debug" or "pairswap=trace" (overrides config)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a fresh pool and fund the configured accounts
    Init {
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Seed reserves (authority only)
    AddLiquidity {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        amount1: u64,
        #[arg(long)]
        amount2: u64,
    },

    /// Withdraw reserves to the authority (authority only)
    RemoveLiquidity {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        amount1: u64,
        #[arg(long)]
        amount2: u64,
    },

    /// Exchange one pool asset for the other
    Swap {
        #[arg(long)]
        caller: String,
        #[arg(short, long, value_enum)]
        direction: DirectionArg,
        #[arg(short, long)]
        amount: u64,
    },

    /// Projected output for an input amount, without trading
    Quote {
        /// Input asset symbol or id
        #[arg(long)]
        asset: String,
        #[arg(short, long)]
        amount: u64,
    },

    /// Spot price of an asset in units of the other
    Price {
        /// Asset symbol or id
        #[arg(long)]
        asset: String,
    },

    /// Show reserves and pool state
    Reserves,

    /// Show every account's balances and the pool custody
    Balances,

    /// Sweep the pool's whole holdings to the authority (authority only)
    EmergencyWithdraw {
        #[arg(long)]
        caller: String,
    },

    /// Hand the authority role to another account
    TransferAuthority {
        #[arg(long)]
        caller: String,
        /// Account name or base58 id
        #[arg(long)]
        to: String,
    },

    /// Run seeded random swaps against a copy of the pool
    Simulate {
        #[arg(long, default_value_t = 1_000)]
        swaps: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Largest single swap input, in smallest units
        #[arg(long, default_value_t = 1_000_000)]
        max_amount: u64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    Forward,
    Backward,
}

impl From<DirectionArg> for SwapDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Forward => SwapDirection::Forward,
            DirectionArg::Backward => SwapDirection::Backward,
        }
    }
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command and return its JSON output
    pub async fn execute(command: Commands, cfg: &AppCfg) -> Result<Value, AppError> {
        let store = StateStore::new(&cfg.state_file);
        match command {
            Commands::Init { force } => Self::execute_init_command(force, cfg, &store).await,
            Commands::AddLiquidity { caller, amount1, amount2 } => {
                let session = Self::load(&store)?;
                let caller = session.account(&caller)?;
                let reserves = session.service.add_liquidity(&caller, amount1, amount2).await?;
                Self::commit(&store, &session, json!({ "reserves": reserves })).await
            }
            Commands::RemoveLiquidity { caller, amount1, amount2 } => {
                let session = Self::load(&store)?;
                let caller = session.account(&caller)?;
                let reserves = session.service.remove_liquidity(&caller, amount1, amount2).await?;
                Self::commit(&store, &session, json!({ "reserves": reserves })).await
            }
            Commands::Swap { caller, direction, amount } => {
                let session = Self::load(&store)?;
                let caller = session.account(&caller)?;
                let outcome = session.service.swap(&caller, direction.into(), amount).await?;
                Self::commit(&store, &session, json!({ "swap": outcome })).await
            }
            Commands::EmergencyWithdraw { caller } => {
                let session = Self::load(&store)?;
                let caller = session.account(&caller)?;
                let sweep = session.service.emergency_withdraw(&caller).await?;
                Self::commit(&store, &session, json!({ "swept": sweep })).await
            }
            Commands::TransferAuthority { caller, to } => {
                let session = Self::load(&store)?;
                let caller = session.account(&caller)?;
                let new_authority = session.account(&to)?;
                session.service.transfer_authority(&caller, new_authority).await?;
                Self::commit(&store, &session, json!({ "authority": new_authority })).await
            }
            Commands::Quote { asset, amount } => {
                let session = Self::load(&store)?;
                let asset_id = session.asset(&asset)?;
                let amount_out = session.service.quote(&asset_id, amount).await?;
                Ok(json!({ "asset_in": asset_id, "amount_in": amount, "amount_out": amount_out }))
            }
            Commands::Price { asset } => {
                let session = Self::load(&store)?;
                let asset_id = session.asset(&asset)?;
                let price = session.service.spot_price(&asset_id).await?;
                Ok(json!({
                    "asset": asset_id,
                    "price_scaled": price.to_string(),
                    "price": format_price(price),
                }))
            }
            Commands::Reserves => {
                let session = Self::load(&store)?;
                let reserves = session.service.reserves().await;
                Ok(json!({
                    "reserve1": reserves.reserve1,
                    "reserve2": reserves.reserve2,
                    "k": reserves.k().to_string(),
                    "state": session.service.state().await.as_str(),
                }))
            }
            Commands::Balances => {
                let session = Self::load(&store)?;
                Ok(Self::balances(&session).await)
            }
            Commands::Simulate { swaps, seed, max_amount } => {
                let params = SimulationParams { swaps, seed, max_amount };
                Self::execute_simulate_command(params, &store).await
            }
        }
    }

    async fn execute_init_command(
        force: bool,
        cfg: &AppCfg,
        store: &StateStore,
    ) -> Result<Value, AppError> {
        if store.exists() && !force {
            return Err(AppError::StateError(format!(
                "{} already exists, pass --force to overwrite",
                store.path().display()
            )));
        }
        let session = Session::bootstrap(&cfg.config)?;
        store.save(&session.to_state().await)?;
        info!("Initialized pool state at {}", store.path().display());

        let snapshot = session.service.snapshot().await;
        Ok(json!({
            "pool": snapshot.address,
            "asset1": session.asset1.token(),
            "asset2": session.asset2.token(),
            "authority": snapshot.authority,
            "accounts": session.accounts,
        }))
    }

    /// Runs against the loaded state but never writes it back
    async fn execute_simulate_command(
        params: SimulationParams,
        store: &StateStore,
    ) -> Result<Value, AppError> {
        let session = Self::load(store)?;
        let trader = AccountId::new_unique();
        let budget = params.max_amount.saturating_mul(u64::from(params.swaps));
        session.asset1.mint(&trader, budget);
        session.asset2.mint(&trader, budget);

        let report = run_simulation(&session.service, &trader, &params).await?;
        session.take_events();
        if !report.invariant_held {
            warn!("Simulation {} observed a shrinking invariant", report.run_id);
        }
        report.to_value().map_err(|e| AppError::StateError(e.to_string()))
    }

    async fn balances(session: &Session) -> Value {
        let decimals1 = session.asset1.decimals();
        let decimals2 = session.asset2.decimals();
        let mut accounts = serde_json::Map::new();
        for (name, id) in &session.accounts {
            let mut row = serde_json::Map::new();
            row.insert("id".to_string(), json!(id));
            row.insert(
                session.asset1.symbol().to_string(),
                json!(format_amount(session.asset1.balance_of(id), decimals1)),
            );
            row.insert(
                session.asset2.symbol().to_string(),
                json!(format_amount(session.asset2.balance_of(id), decimals2)),
            );
            accounts.insert(name.clone(), Value::Object(row));
        }
        let custody = session.asset1.custody();
        let reserves = session.service.reserves().await;
        json!({
            "accounts": accounts,
            "pool": {
                "id": custody,
                "held1": format_amount(session.asset1.balance_of(&custody), decimals1),
                "held2": format_amount(session.asset2.balance_of(&custody), decimals2),
                "reserve1": format_amount(reserves.reserve1, decimals1),
                "reserve2": format_amount(reserves.reserve2, decimals2),
            },
        })
    }

    fn load(store: &StateStore) -> Result<Session, AppError> {
        Session::from_state(store.load()?)
    }

    /// Persist the session and attach the events it emitted to `output`
    async fn commit(
        store: &StateStore,
        session: &Session,
        mut output: Value,
    ) -> Result<Value, AppError> {
        store.save(&session.to_state().await)?;
        let events: Vec<PoolEvent> = session.take_events();
        if let Value::Object(map) = &mut output {
            let events = serde_json::to_value(&events)
                .map_err(|e| AppError::StateError(e.to_string()))?;
            map.insert("events".to_string(), events);
        }
        Ok(output)
    }
}
