//! Conversion of columnar view-query results into gift records.
//!
//! The gift program answers `view_*_gifts` with three parallel columns:
//! counterparty addresses, amounts in base units and release timestamps.
//! Everything here is pure so it can be tested without a ledger.

use serde_json::Value;
use thiserror::Error;

use crate::model::{Address, AddressError, Direction, GiftRecord};
use crate::amount::parse_digits;
use crate::{Amount, AmountError};

/// Errors that can occur when mapping a view-query result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("unexpected response shape: {0}")]
    Shape(String),

    #[error("column length mismatch: {counterparties} addresses, {amounts} amounts, {timestamps} timestamps")]
    RaggedColumns {
        counterparties: usize,
        amounts: usize,
        timestamps: usize,
    },

    #[error("row {row}: {source}")]
    Address { row: usize, source: AddressError },

    #[error("row {row}: {source}")]
    Amount { row: usize, source: AmountError },

    #[error("row {row}: invalid timestamp '{value}'")]
    Timestamp { row: usize, value: String },
}

/// Raw parallel columns as returned by the ledger, still stringly typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGiftColumns {
    pub counterparties: Vec<String>,
    pub amounts: Vec<String>,
    pub timestamps: Vec<String>,
}

impl RawGiftColumns {
    pub fn new(counterparties: Vec<String>, amounts: Vec<String>, timestamps: Vec<String>) -> Self {
        Self {
            counterparties,
            amounts,
            timestamps,
        }
    }

    /// Extract the first three columns of a view response.
    ///
    /// Numeric cells are accepted as JSON numbers or strings, since u64 values
    /// are serialized as strings by the node but not by every client.
    pub fn from_value(value: &Value) -> Result<Self, MapError> {
        let columns = value
            .as_array()
            .ok_or_else(|| MapError::Shape(format!("expected an array of columns, got {}", kind(value))))?;
        if columns.len() < 3 {
            return Err(MapError::Shape(format!(
                "expected 3 columns, got {}",
                columns.len()
            )));
        }

        Ok(Self {
            counterparties: column(&columns[0], 0)?,
            amounts: column(&columns[1], 1)?,
            timestamps: column(&columns[2], 2)?,
        })
    }

    pub fn len(&self) -> usize {
        self.counterparties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counterparties.is_empty() && self.amounts.is_empty() && self.timestamps.is_empty()
    }
}

fn column(value: &Value, index: usize) -> Result<Vec<String>, MapError> {
    let cells = value
        .as_array()
        .ok_or_else(|| MapError::Shape(format!("column {index} is {}, not an array", kind(value))))?;
    cells
        .iter()
        .map(|cell| match cell {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(MapError::Shape(format!(
                "column {index} contains {}",
                kind(other)
            ))),
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build the gift sequence for `direction` from raw columns.
///
/// Received gifts are sorted by release time (stable, so equal timestamps keep
/// ledger order). Sent gifts keep ledger order.
pub fn map_gifts(raw: &RawGiftColumns, direction: Direction) -> Result<Vec<GiftRecord>, MapError> {
    let rows = raw.counterparties.len();
    if raw.amounts.len() != rows || raw.timestamps.len() != rows {
        return Err(MapError::RaggedColumns {
            counterparties: rows,
            amounts: raw.amounts.len(),
            timestamps: raw.timestamps.len(),
        });
    }

    let mut gifts = Vec::with_capacity(rows);
    for row in 0..rows {
        let counterparty: Address = raw.counterparties[row]
            .parse()
            .map_err(|source| MapError::Address { row, source })?;
        let amount = Amount::parse_base_units(&raw.amounts[row])
            .map_err(|source| MapError::Amount { row, source })?;
        let release_timestamp =
            parse_digits(&raw.timestamps[row]).ok_or_else(|| MapError::Timestamp {
                row,
                value: raw.timestamps[row].clone(),
            })?;
        gifts.push(GiftRecord::new(counterparty, amount, release_timestamp));
    }

    if direction == Direction::Received {
        gifts.sort_by_key(|gift| gift.release_timestamp);
    }

    Ok(gifts)
}
