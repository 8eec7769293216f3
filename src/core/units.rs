//! Ether denominations
//!
//! Renders wei amounts as human-readable gwei/ether strings for logging
//! balances and gas prices.

/// Wei per gwei
pub const GWEI: u128 = 1_000_000_000;

/// Wei per ether
pub const ETHER: u128 = 1_000_000_000_000_000_000;

/// Format a wei amount with the given number of decimals, trimming trailing
/// zeros but always keeping one fractional digit (`1.0`, `0.58`)
pub fn format_units(wei: u128, decimals: u32) -> String {
    let unit = 10u128.pow(decimals);
    let whole = wei / unit;
    let fraction = wei % unit;

    if decimals == 0 {
        return whole.to_string();
    }

    let mut fraction = format!("{:0width$}", fraction, width = decimals as usize);
    while fraction.len() > 1 && fraction.ends_with('0') {
        fraction.pop();
    }
    format!("{}.{}", whole, fraction)
}

/// Format a wei amount as gwei
pub fn format_gwei(wei: u128) -> String {
    format_units(wei, 9)
}

/// Format a wei amount as ether
pub fn format_ether(wei: u128) -> String {
    format_units(wei, 18)
}
