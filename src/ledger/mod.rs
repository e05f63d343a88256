//! Read-only access to the ledger.
//!
//! [`LedgerReader`] is the transport seam; [`LedgerQueryClient`] sits on top
//! of it and applies the fail-soft policy: every failure becomes "no data"
//! (empty columns or a zero balance) and is logged, never propagated.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::Amount;
use crate::config::{Config, DEFAULT_COIN_TYPE, GiftModule};
use crate::mapper::RawGiftColumns;
use crate::model::{Address, Direction};

mod error;
pub use error::LedgerError;

mod http;
pub use http::HttpLedger;

pub const COIN_BALANCE_FUNCTION: &str = "0x1::coin::balance";

/// Body of a view request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewRequest {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<String>,
}

impl ViewRequest {
    pub fn new(function: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            function: function.into(),
            type_arguments: Vec::new(),
            arguments,
        }
    }

    pub fn with_type_arguments(mut self, type_arguments: Vec<String>) -> Self {
        self.type_arguments = type_arguments;
        self
    }
}

/// Something that can answer view requests.
#[async_trait]
pub trait LedgerReader: Send + Sync + 'static {
    async fn view(&self, request: &ViewRequest) -> Result<Value, LedgerError>;
}

/// Issues the gift and balance view queries for an account.
pub struct LedgerQueryClient<R> {
    reader: R,
    module: GiftModule,
    coin_type: String,
}

impl<R: LedgerReader> LedgerQueryClient<R> {
    pub fn new(reader: R, module: GiftModule) -> Self {
        Self {
            reader,
            module,
            coin_type: DEFAULT_COIN_TYPE.to_string(),
        }
    }

    pub fn from_config(reader: R, config: &Config) -> Self {
        Self::new(reader, config.module.clone()).with_coin_type(config.coin_type.clone())
    }

    pub fn with_coin_type(mut self, coin_type: impl Into<String>) -> Self {
        self.coin_type = coin_type.into();
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn gifts_request(&self, direction: Direction, account: &Address) -> ViewRequest {
        let function = match direction {
            Direction::Sent => GiftModule::VIEW_GIFTERS_GIFTS,
            Direction::Received => GiftModule::VIEW_RECIPIENTS_GIFTS,
        };
        ViewRequest::new(self.module.function(function), vec![account.to_string()])
    }

    pub fn balance_request(&self, account: &Address) -> ViewRequest {
        ViewRequest::new(COIN_BALANCE_FUNCTION, vec![account.to_string()])
            .with_type_arguments(vec![self.coin_type.clone()])
    }

    /// Fetch the raw gift columns for `account`. Empty on any failure.
    pub async fn view_gifts(&self, direction: Direction, account: &Address) -> RawGiftColumns {
        let request = self.gifts_request(direction, account);
        let value = match self.reader.view(&request).await {
            Ok(value) => value,
            Err(e) => {
                warn!(account = %account, direction = %direction, reason = %e, "gift query failed");
                return RawGiftColumns::default();
            }
        };
        match RawGiftColumns::from_value(&value) {
            Ok(columns) => columns,
            Err(e) => {
                warn!(account = %account, direction = %direction, reason = %e, "gift query returned malformed data");
                RawGiftColumns::default()
            }
        }
    }

    /// Fetch the coin balance of `account`. Zero on any failure.
    pub async fn balance(&self, account: &Address) -> Amount {
        let request = self.balance_request(account);
        match self.reader.view(&request).await {
            Ok(value) => parse_balance(&value).unwrap_or_else(|| {
                warn!(account = %account, response = %value, "balance query returned no balance");
                Amount::ZERO
            }),
            Err(e) => {
                warn!(account = %account, reason = %e, "balance query failed");
                Amount::ZERO
            }
        }
    }
}

/// Read a balance from a view response: an integer string or number,
/// optionally wrapped in a one-element array. Error objects yield `None`.
pub fn parse_balance(value: &Value) -> Option<Amount> {
    match value {
        Value::String(s) => Amount::parse_base_units(s).ok(),
        Value::Number(n) => n.as_u64().map(Amount::from_base_units),
        Value::Array(items) if items.len() == 1 => parse_balance(&items[0]),
        _ => None,
    }
}
