//! Host store keys and bech32 address decoding

use crate::error::{EngineError, EngineResult};

use bech32::FromBase32;

const VALIDATORS_KEY: u8 = 0x21;
const DELEGATION_KEY: u8 = 0x31;
const BALANCES_PREFIX: u8 = 0x02;

/// Decode a bech32 address whose human readable part starts with `prefix`.
/// Validator operator addresses use `{prefix}valoper`.
pub fn decode_address(address: &str, prefix: &str) -> EngineResult<Vec<u8>> {
    let invalid = |reason: String| EngineError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let (hrp, data, _variant) = bech32::decode(address).map_err(|e| invalid(e.to_string()))?;
    if !hrp.starts_with(prefix) {
        return Err(invalid(format!("expected prefix {}, got {}", prefix, hrp)));
    }
    Vec::<u8>::from_base32(&data).map_err(|e| invalid(e.to_string()))
}

fn length_prefixed(bytes: &[u8]) -> EngineResult<Vec<u8>> {
    let len = u8::try_from(bytes.len())
        .map_err(|_| EngineError::InvalidRequest(format!("address too long: {} bytes", bytes.len())))?;
    let mut out = Vec::with_capacity(bytes.len() + 1);
    out.push(len);
    out.extend_from_slice(bytes);
    Ok(out)
}

pub fn validator_key(validator: &[u8]) -> EngineResult<Vec<u8>> {
    let mut key = vec![VALIDATORS_KEY];
    key.extend(length_prefixed(validator)?);
    Ok(key)
}

pub fn delegation_key(delegator: &[u8], validator: &[u8]) -> EngineResult<Vec<u8>> {
    let mut key = vec![DELEGATION_KEY];
    key.extend(length_prefixed(delegator)?);
    key.extend(length_prefixed(validator)?);
    Ok(key)
}

/// Key of `address`'s balance of `denom`
pub fn balance_key(address: &[u8], denom: &str) -> EngineResult<Vec<u8>> {
    let mut key = vec![BALANCES_PREFIX];
    key.extend(length_prefixed(address)?);
    key.extend_from_slice(denom.as_bytes());
    Ok(key)
}
