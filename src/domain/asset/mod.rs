//! Asset domain - the fungible-asset ledger the pool moves funds through

mod asset_interface;

pub use asset_interface::FungibleAsset;
