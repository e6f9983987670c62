use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::{fs, path::Path};

use crate::shared::errors::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct PoolCfg {
    /// Account name of the pool authority
    pub authority: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetCfg {
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountCfg {
    pub name: String,
    /// Opening balance of asset1
    #[serde(default)]
    pub balance1: u64,
    /// Opening balance of asset2
    #[serde(default)]
    pub balance2: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pool: PoolCfg,
    pub assets: Vec<AssetCfg>,
    #[serde(default)]
    pub accounts: Vec<AccountCfg>,
    pub state_file: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        let cfg: Self = toml::from_str(&s).context("parse Pool.toml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Exactly two distinct assets, unique account names, and an authority
    /// that names one of the accounts
    pub fn validate(&self) -> Result<(), AppError> {
        if self.assets.len() != 2 {
            return Err(AppError::ConfigError(format!(
                "expected exactly 2 assets, found {}",
                self.assets.len()
            )));
        }
        if self.assets[0].symbol.eq_ignore_ascii_case(&self.assets[1].symbol) {
            return Err(AppError::ConfigError(format!(
                "asset symbols must differ, both are {}",
                self.assets[0].symbol
            )));
        }

        let mut names = HashSet::new();
        for account in &self.accounts {
            if !names.insert(account.name.as_str()) {
                return Err(AppError::ConfigError(format!(
                    "duplicate account name {}",
                    account.name
                )));
            }
        }
        if !names.contains(self.pool.authority.as_str()) {
            return Err(AppError::ConfigError(format!(
                "authority {} is not a configured account",
                self.pool.authority
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool: PoolCfg {
                authority: "owner".to_string(),
            },
            assets: vec![
                AssetCfg {
                    symbol: "ALPHA".to_string(),
                    decimals: 6,
                },
                AssetCfg {
                    symbol: "BETA".to_string(),
                    decimals: 6,
                },
            ],
            accounts: vec![
                AccountCfg {
                    name: "owner".to_string(),
                    balance1: 1_000_000_000_000,
                    balance2: 1_000_000_000_000,
                },
                AccountCfg {
                    name: "alice".to_string(),
                    balance1: 10_000_000_000,
                    balance2: 10_000_000_000,
                },
            ],
            state_file: None,
            log_level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
state_file = "pool-state.json"
log_level = "debug"

[pool]
authority = "owner"

[[assets]]
symbol = "USDX"
decimals = 6

[[assets]]
symbol = "WETH"
decimals = 18

[[accounts]]
name = "owner"
balance1 = 5000
balance2 = 7000

[[accounts]]
name = "bob"
balance1 = 10
"#;

    #[test]
    fn test_parse_sample() {
        let cfg: Config = toml::from_str(SAMPLE).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.assets[1].symbol, "WETH");
        assert_eq!(cfg.assets[1].decimals, 18);
        assert_eq!(cfg.accounts[1].balance2, 0);
        assert_eq!(cfg.state_file.as_deref(), Some("pool-state.json"));
    }

    #[test]
    fn test_default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let mut cfg = Config::default();
        cfg.assets.pop();
        assert!(matches!(cfg.validate(), Err(AppError::ConfigError(_))));

        let mut cfg = Config::default();
        cfg.assets[1].symbol = "alpha".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.pool.authority = "mallory".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        let dup = cfg.accounts[0].clone();
        cfg.accounts.push(dup);
        assert!(cfg.validate().is_err());
    }
}
