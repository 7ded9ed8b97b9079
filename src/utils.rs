//! Small parsing helpers shared by the chain client and the action layer

use anyhow::{anyhow, Result};
use ethers::types::U256;
use serde_json::Value;

/// Parses a `0x`-prefixed JSON-RPC quantity such as `"0x2105"`.
pub fn parse_hex_quantity(value: &Value) -> Result<U256> {
    let raw = value
        .as_str()
        .ok_or_else(|| anyhow!("expected a hex quantity, got {}", value))?;
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| anyhow!("invalid hex quantity '{}': {}", raw, e))
}

/// True for a non-empty string of ASCII digits: no sign, no decimal point, no exponent.
pub fn is_base_unit_amount(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}
