//! Error handling for the application

use thiserror::Error;

use crate::shared::types::{AccountId, AssetId};

/// Pool engine errors. Every variant rejects the whole call with no reserve
/// change and no event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Output amount rounds down to zero")]
    InsufficientAmount,

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Asset {0} is not part of this pool")]
    InvalidToken(AssetId),

    #[error("Transfer of {amount} units of asset {asset} failed")]
    TransferFailed { asset: AssetId, amount: u64 },

    #[error("Caller {0} is not the pool authority")]
    Unauthorized(AccountId),

    #[error("Pool operation already in progress")]
    Reentrant,

    #[error("Pool assets must be distinct")]
    IdenticalAssets,

    #[error("Reserve arithmetic overflow")]
    Overflow,
}

impl PoolError {
    /// Stable short name, used for tallies in simulation reports
    pub fn kind(&self) -> &'static str {
        match self {
            PoolError::ZeroAmount => "zero_amount",
            PoolError::InsufficientAmount => "insufficient_amount",
            PoolError::InsufficientLiquidity => "insufficient_liquidity",
            PoolError::InvalidToken(_) => "invalid_token",
            PoolError::TransferFailed { .. } => "transfer_failed",
            PoolError::Unauthorized(_) => "unauthorized",
            PoolError::Reentrant => "reentrant",
            PoolError::IdenticalAssets => "identical_assets",
            PoolError::Overflow => "overflow",
        }
    }
}

/// Identity parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("Invalid base58: {0}")]
    Base58(String),

    #[error("Expected 32 bytes, got {0}")]
    Length(usize),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}

impl From<ParseIdError> for AppError {
    fn from(err: ParseIdError) -> Self {
        AppError::StateError(err.to_string())
    }
}
