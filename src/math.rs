// src/math.rs
//! Constant-product pricing in integer arithmetic. Every division truncates,
//! which rounds each quote slightly in the pool's favour.

/// Swap fee numerator (30 / 10_000 = 0.30%)
pub const FEE_NUMERATOR: u64 = 30;

/// Swap fee denominator
pub const FEE_DENOMINATOR: u64 = 10_000;

/// Fixed-point scale for spot prices (1e18)
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Input that participates in pricing after the fee is excluded
pub fn amount_in_with_fee(amount_in: u64) -> u64 {
    let scaled = amount_in as u128 * (FEE_DENOMINATOR - FEE_NUMERATOR) as u128;
    (scaled / FEE_DENOMINATOR as u128) as u64
}

/// Portion of the input kept by the pool as fee
pub fn fee_retained(amount_in: u64) -> u64 {
    amount_in - amount_in_with_fee(amount_in)
}

/// Constant-product output for `amount_in` against the given reserves.
///
/// `amount_out = floor(w * reserve_out / (reserve_in + w))` with `w` the
/// fee-adjusted input. The result is always strictly below `reserve_out`
/// when `reserve_in > 0`.
pub fn amount_out(amount_in: u64, reserve_in: u64, reserve_out: u64) -> u64 {
    let with_fee = amount_in_with_fee(amount_in) as u128;
    let denominator = reserve_in as u128 + with_fee;
    if denominator == 0 {
        return 0;
    }
    // bounded by reserve_out, so the narrowing cast is lossless
    (with_fee * reserve_out as u128 / denominator) as u64
}

/// Price of the queried asset in units of the other, scaled by 1e18.
/// Zero when either reserve is empty.
pub fn spot_price(reserve_queried: u64, reserve_other: u64) -> u128 {
    if reserve_queried == 0 || reserve_other == 0 {
        return 0;
    }
    reserve_other as u128 * PRICE_PRECISION / reserve_queried as u128
}

/// The constant product `k = reserve1 * reserve2`
pub fn invariant(reserve1: u64, reserve2: u64) -> u128 {
    reserve1 as u128 * reserve2 as u128
}

/// Growth of `k` in basis points; zero when the starting product is zero
pub fn invariant_growth_bps(k_before: u128, k_after: u128) -> u128 {
    if k_before == 0 || k_after <= k_before {
        return 0;
    }
    let growth = k_after - k_before;
    match growth.checked_mul(FEE_DENOMINATOR as u128) {
        Some(scaled) => scaled / k_before,
        // scale the divisor down instead once the product no longer fits
        None => growth / (k_before / FEE_DENOMINATOR as u128).max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_rounding() {
        assert_eq!(amount_in_with_fee(100), 99);
        assert_eq!(amount_in_with_fee(10_000), 9_970);
        assert_eq!(amount_in_with_fee(1), 0);
        assert_eq!(amount_in_with_fee(2), 1);
        assert_eq!(fee_retained(100), 1);
        assert_eq!(fee_retained(10_000), 30);
    }

    #[test]
    fn test_amount_out_reference_scenario() {
        // 99 * 1000 / 1099 = 90.08
        assert_eq!(amount_out(100, 1_000, 1_000), 90);
    }

    #[test]
    fn test_amount_out_never_drains_reserve() {
        assert_eq!(amount_out(u64::MAX, 1, 1_000), 999);
        assert!(amount_out(u64::MAX, 1_000, u64::MAX) < u64::MAX);
    }

    #[test]
    fn test_amount_out_empty_pool() {
        assert_eq!(amount_out(0, 0, 1_000), 0);
        assert_eq!(amount_out(100, 1_000, 0), 0);
    }

    #[test]
    fn test_spot_price() {
        assert_eq!(spot_price(1_000, 2_000), 2 * PRICE_PRECISION);
        assert_eq!(spot_price(2_000, 1_000), PRICE_PRECISION / 2);
        assert_eq!(spot_price(0, 1_000), 0);
        assert_eq!(spot_price(1_000, 0), 0);
        assert_eq!(spot_price(1, u64::MAX), u64::MAX as u128 * PRICE_PRECISION);
    }

    #[test]
    fn test_invariant_growth() {
        assert_eq!(invariant(1_100, 910), 1_001_000);
        assert_eq!(invariant_growth_bps(1_000_000, 1_001_000), 10);
        assert_eq!(invariant_growth_bps(0, 10), 0);
        assert_eq!(invariant_growth_bps(10, 9), 0);
    }

    #[test]
    fn test_invariant_growth_with_huge_products() {
        let before = invariant(1_000_000_000_000_000, 1_000_000_000_000_000);
        let after = invariant(200_000_000_000_000_000, 200_000_000_000_000_000);
        // (4e34 - 1e30) * 1e4 / 1e30
        assert_eq!(invariant_growth_bps(before, after), 399_990_000);
        assert_eq!(invariant_growth_bps(1, u128::MAX), u128::MAX - 1);
    }
}
