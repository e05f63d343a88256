//! Core domain types for gift synchronization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Amount;

/// Error returned when parsing a malformed account address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address '{0}': expected 0x followed by 1 to 64 hex digits")]
pub struct AddressError(pub String);

/// A ledger account address (`0x` + 1..=64 hex digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    const MAX_HEX_DIGITS: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| AddressError(s.to_string()))?;
        let well_formed = !hex.is_empty()
            && hex.len() <= Self::MAX_HEX_DIGITS
            && hex.bytes().all(|b| b.is_ascii_hexdigit());
        if !well_formed {
            return Err(AddressError(s.to_string()));
        }
        Ok(Address(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of a gift edge the viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Gifts the viewer sent; the counterparty is the recipient.
    Sent,
    /// Gifts sent to the viewer; the counterparty is the sender.
    Received,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Sent => f.write_str("sent"),
            Direction::Received => f.write_str("received"),
        }
    }
}

/// One outstanding gift as seen from the viewer's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftRecord {
    pub counterparty: Address,
    pub amount: Amount,
    /// Unix seconds after which the gift can be claimed.
    pub release_timestamp: u64,
}

impl GiftRecord {
    pub fn new(counterparty: Address, amount: Amount, release_timestamp: u64) -> Self {
        Self {
            counterparty,
            amount,
            release_timestamp,
        }
    }
}
