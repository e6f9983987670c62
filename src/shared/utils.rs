//! Utility functions and helpers

use crate::math::PRICE_PRECISION;

/// Format a raw amount with its decimals, without going through floats
pub fn format_amount(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let Some(scale) = 10u128.checked_pow(decimals as u32) else {
        return amount.to_string();
    };
    let whole = amount as u128 / scale;
    let frac = amount as u128 % scale;
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Render a 1e18-scaled spot price as a decimal string
pub fn format_price(price: u128) -> String {
    let whole = price / PRICE_PRECISION;
    let frac = format!("{:018}", price % PRICE_PRECISION);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}
