//! Runtime configuration read from the process environment.

use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com/v1";
pub const DEFAULT_COIN_TYPE: &str = "0x1::aptos_coin::AptosCoin";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("{key} must be an integer number of milliseconds, got '{value}'")]
    InvalidDelay { key: &'static str, value: String },
}

/// The gift program's `address::module` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftModule {
    pub address: String,
    pub name: String,
}

impl GiftModule {
    pub const VIEW_RECIPIENTS_GIFTS: &'static str = "view_recipients_gifts";
    pub const VIEW_GIFTERS_GIFTS: &'static str = "view_gifters_gifts";
    pub const ADD_GIFT: &'static str = "add_birthday_gift";
    pub const CLAIM_GIFT: &'static str = "claim_birthday_gift";
    pub const REMOVE_GIFT: &'static str = "remove_birthday_gift";

    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    /// Fully-qualified `address::module::function` identifier.
    pub fn function(&self, function: &str) -> String {
        format!("{}::{}::{}", self.address, self.name, function)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub node_url: String,
    pub module: GiftModule,
    pub coin_type: String,
    /// Wait after a successful submission before the lock is released.
    pub settle_delay: Duration,
}

impl Config {
    pub const MODULE_ADDRESS: &'static str = "MODULE_ADDRESS";
    pub const MODULE_NAME: &'static str = "MODULE_NAME";
    pub const SETTLE_DELAY: &'static str = "TRANSACTION_DELAY_MILLISECONDS";
    pub const NODE_URL: &'static str = "APTOS_NODE_URL";
    pub const COIN_TYPE: &'static str = "APTOS_COIN_TYPE";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let address = get(Self::MODULE_ADDRESS).ok_or(ConfigError::Missing(Self::MODULE_ADDRESS))?;
        let name = get(Self::MODULE_NAME).ok_or(ConfigError::Missing(Self::MODULE_NAME))?;

        let settle_delay = match get(Self::SETTLE_DELAY) {
            Some(raw) => {
                let millis = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidDelay {
                        key: Self::SETTLE_DELAY,
                        value: raw.clone(),
                    })?;
                Duration::from_millis(millis)
            }
            None => Duration::ZERO,
        };

        Ok(Self {
            node_url: get(Self::NODE_URL).unwrap_or_else(|| DEFAULT_NODE_URL.to_string()),
            module: GiftModule::new(address, name),
            coin_type: get(Self::COIN_TYPE).unwrap_or_else(|| DEFAULT_COIN_TYPE.to_string()),
            settle_delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_values_unset() {
        let config =
            Config::from_lookup(lookup(&[("MODULE_ADDRESS", "0xcafe"), ("MODULE_NAME", "birthday_bot")]))
                .unwrap();
        assert_eq!(config.node_url, DEFAULT_NODE_URL);
        assert_eq!(config.coin_type, DEFAULT_COIN_TYPE);
        assert_eq!(config.settle_delay, Duration::ZERO);
        assert_eq!(
            config.module.function(GiftModule::CLAIM_GIFT),
            "0xcafe::birthday_bot::claim_birthday_gift"
        );
    }

    #[test]
    fn settle_delay_is_parsed_in_milliseconds() {
        let config = Config::from_lookup(lookup(&[
            ("MODULE_ADDRESS", "0xcafe"),
            ("MODULE_NAME", "birthday_bot"),
            ("TRANSACTION_DELAY_MILLISECONDS", "1500"),
            ("APTOS_NODE_URL", "http://localhost:8080/v1"),
        ]))
        .unwrap();
        assert_eq!(config.settle_delay, Duration::from_millis(1500));
        assert_eq!(config.node_url, "http://localhost:8080/v1");
    }

    #[test]
    fn invalid_delay_is_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("MODULE_ADDRESS", "0xcafe"),
            ("MODULE_NAME", "birthday_bot"),
            ("TRANSACTION_DELAY_MILLISECONDS", "soon"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidDelay { .. })));
    }

    #[test]
    fn module_identity_is_required() {
        let result = Config::from_lookup(lookup(&[("MODULE_NAME", "birthday_bot")]));
        assert_eq!(result, Err(ConfigError::Missing("MODULE_ADDRESS")));

        let result = Config::from_lookup(lookup(&[("MODULE_ADDRESS", "0xcafe"), ("MODULE_NAME", " ")]));
        assert_eq!(result, Err(ConfigError::Missing("MODULE_NAME")));
    }
}
