use alloy::primitives::{Address, B256, U256};
use chrono::Local;

/// Truncate a B256 hash to "0xabcd...ef12" format
pub fn truncate_hash(hash: &B256) -> String {
    truncate(&format!("{hash}"))
}

/// Truncate an address to "0xabcd...ef12" format
pub fn truncate_address(addr: &Address) -> String {
    truncate(&format!("{addr}"))
}

fn truncate(s: &str) -> String {
    if s.len() > 14 {
        format!("{}...{}", &s[..8], &s[s.len() - 4..])
    } else {
        s.to_string()
    }
}

/// Format a wei amount in whole units of an 18-decimal currency.
pub fn format_ether(wei: U256) -> String {
    format_u256_as_decimal(wei, 18)
}

/// Format a U256 value as decimal with given decimals
pub fn format_u256_as_decimal(value: U256, decimals: u8) -> String {
    if value.is_zero() {
        return "0.0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        return format!("{whole}.0");
    }

    let remainder_str = format!("{remainder}");
    let padded = format!("{:0>width$}", remainder_str, width = decimals as usize);
    let trimmed = padded.trim_end_matches('0');

    format!("{whole}.{trimmed}")
}

/// Format an 18-decimal fixed-point USD amount as "$1.23".
pub fn format_usd(value: U256) -> String {
    let cents = value / U256::from(10u64).pow(U256::from(16u64));
    let whole = cents / U256::from(100u64);
    let frac = (cents % U256::from(100u64)).to::<u64>();
    format!("${whole}.{frac:02}")
}

/// Format a number with comma separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Local wall-clock time as "HH:MM:SS".
pub fn clock_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
