//! Identity normalization.
//!
//! Every ledger key passes through [`normalize`] first, so `0xabc…`,
//! `0xABC…` and the EIP-55 form of one account always land on the same
//! entry. Keys are stored as 20-byte [`Address`] values; the checksummed
//! string is only a presentation of that key.

use alloy::primitives::Address;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{TreasuryError, TreasuryResult};

const ADDRESS_PREFIX: &str = "0x";
const ADDRESS_HEX_LEN: usize = 40;

/// A canonical account identity used as a ledger key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(Address);

impl Identity {
    /// Raw account address.
    pub fn address(&self) -> Address {
        self.0
    }

    /// EIP-55 mixed-case form.
    pub fn checksummed(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl From<Address> for Identity {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.checksummed())
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.checksummed())
    }
}

/// Validate the hex-address shape and return the canonical identity.
///
/// The input must be exactly `0x` plus 40 hex digits; surrounding
/// whitespace is rejected. Any letter casing is accepted; the checksum is
/// recomputed rather than verified.
pub fn normalize(raw: &str) -> TreasuryResult<Identity> {
    let hex = raw
        .strip_prefix(ADDRESS_PREFIX)
        .ok_or_else(|| TreasuryError::InvalidIdentity(format!("{raw:?}: missing 0x prefix")))?;

    if hex.len() != ADDRESS_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(TreasuryError::InvalidIdentity(format!(
            "{raw:?}: expected {ADDRESS_HEX_LEN} hex digits"
        )));
    }

    let address: Address = hex
        .parse()
        .map_err(|e| TreasuryError::InvalidIdentity(format!("{raw:?}: {e}")))?;

    Ok(Identity(address))
}
