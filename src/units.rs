//! Conversions between API-facing ETH amounts and ledger wei amounts.
//!
//! The ledger is kept in wei (`U256`) so arithmetic is exact; floats only
//! appear at the HTTP boundary.

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;

use crate::error::{TreasuryError, TreasuryResult};

/// Convert a positive ETH amount from a request body into wei.
///
/// Uses the shortest round-trip decimal form of the float, so `0.1` becomes
/// exactly 10^17 wei rather than the binary approximation.
pub fn parse_eth_amount(amount_eth: f64) -> TreasuryResult<U256> {
    if !amount_eth.is_finite() || amount_eth <= 0.0 {
        return Err(TreasuryError::InvalidAmount(
            "Amount must be positive".to_string(),
        ));
    }

    let wei = parse_ether(&amount_eth.to_string())
        .map_err(|e| TreasuryError::InvalidAmount(format!("{amount_eth}: {e}")))?;

    if wei.is_zero() {
        return Err(TreasuryError::InvalidAmount(format!(
            "{amount_eth} is below one wei"
        )));
    }
    Ok(wei)
}

/// Wei to a float ETH value for display fields.
pub fn wei_to_eth(wei: U256) -> f64 {
    format_ether(wei).parse().unwrap_or(0.0)
}

/// Wei rendered with six decimals, the precision used in messages.
pub fn format_eth(wei: U256) -> String {
    format!("{:.6}", wei_to_eth(wei))
}

/// USD display value of a wei amount at a fixed conversion price.
pub fn wei_to_usd(wei: U256, eth_price_usd: f64) -> f64 {
    wei_to_eth(wei) * eth_price_usd
}
