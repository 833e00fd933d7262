// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults and the [`Config`] loaded from them
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ECOID_RPC_URL` | JSON-RPC endpoint of the EVM network | Avalanche Fuji public RPC |
//! | `ECOID_CHAIN_ID` | Chain id the endpoint must serve; checked before each transaction | `43113` |
//! | `ECOID_REGISTRY_ADDRESS` | EcoID registry contract address | Required for register/mint |
//! | `ECOID_SIGNATURE_TIMEOUT_SECS` | Bound on a wallet signature request | `120` |
//! | `ECOID_TX_TIMEOUT_SECS` | Bound on a transaction and its receipt | `180` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;
use url::Url;

use crate::blockchain::{NetworkConfig, FUJI_CHAIN_ID};
use crate::runtime::Timeouts;
use crate::telemetry::LogFormat;

/// Environment variable name for the JSON-RPC endpoint.
pub const RPC_URL_ENV: &str = "ECOID_RPC_URL";

/// Environment variable name for the chain id.
pub const CHAIN_ID_ENV: &str = "ECOID_CHAIN_ID";

/// Environment variable name for the registry contract address.
///
/// Left unset, register and mint calls fail with a network error.
pub const REGISTRY_ADDRESS_ENV: &str = "ECOID_REGISTRY_ADDRESS";

/// Environment variable name for the signature request timeout, in seconds.
pub const SIGNATURE_TIMEOUT_ENV: &str = "ECOID_SIGNATURE_TIMEOUT_SECS";

/// Environment variable name for the transaction timeout, in seconds.
pub const TX_TIMEOUT_ENV: &str = "ECOID_TX_TIMEOUT_SECS";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not valid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            name,
            reason: reason.to_string(),
        }
    }
}

/// Settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub network: NetworkConfig,
    /// `Address::ZERO` when not configured.
    pub registry_address: Address,
    pub timeouts: Timeouts,
    pub log_format: LogFormat,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read variables. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let network = match read(RPC_URL_ENV) {
            None => NetworkConfig::fuji(),
            Some(raw) => {
                let url = Url::parse(&raw).map_err(|e| ConfigError::invalid(RPC_URL_ENV, e))?;
                let name = url.host_str().unwrap_or("custom").to_string();
                NetworkConfig::new(name, FUJI_CHAIN_ID, url)
            }
        };
        let network = match read(CHAIN_ID_ENV) {
            None => network,
            Some(raw) => NetworkConfig {
                chain_id: raw
                    .parse()
                    .map_err(|e| ConfigError::invalid(CHAIN_ID_ENV, e))?,
                ..network
            },
        };

        let registry_address = match read(REGISTRY_ADDRESS_ENV) {
            None => Address::ZERO,
            Some(raw) => Address::from_str(&raw)
                .map_err(|e| ConfigError::invalid(REGISTRY_ADDRESS_ENV, e))?,
        };

        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            signature: seconds(read(SIGNATURE_TIMEOUT_ENV), SIGNATURE_TIMEOUT_ENV)?
                .unwrap_or(defaults.signature),
            transaction: seconds(read(TX_TIMEOUT_ENV), TX_TIMEOUT_ENV)?
                .unwrap_or(defaults.transaction),
        };

        let log_format = match read(LOG_FORMAT_ENV) {
            None => LogFormat::default(),
            Some(raw) => raw
                .parse()
                .map_err(|e: String| ConfigError::invalid(LOG_FORMAT_ENV, e))?,
        };

        Ok(Self {
            network,
            registry_address,
            timeouts,
            log_format,
        })
    }
}

fn seconds(raw: Option<String>, name: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(name, "must be at least 1 second")),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(ConfigError::invalid(name, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.network, NetworkConfig::fuji());
        assert!(config.registry_address.is_zero());
        assert_eq!(config.timeouts, Timeouts::default());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            (RPC_URL_ENV, "http://127.0.0.1:8545"),
            (CHAIN_ID_ENV, "31337"),
            (
                REGISTRY_ADDRESS_ENV,
                "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            ),
            (SIGNATURE_TIMEOUT_ENV, "5"),
            (TX_TIMEOUT_ENV, " 30 "),
            (LOG_FORMAT_ENV, "json"),
        ]))
        .unwrap();

        assert_eq!(config.network.chain_id, 31337);
        assert_eq!(config.network.name, "127.0.0.1");
        assert_eq!(config.network.rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert!(!config.registry_address.is_zero());
        assert_eq!(config.timeouts.signature, Duration::from_secs(5));
        assert_eq!(config.timeouts.transaction, Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn blank_values_are_unset() {
        let config = Config::from_lookup(lookup(&[(REGISTRY_ADDRESS_ENV, "  ")])).unwrap();
        assert!(config.registry_address.is_zero());
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[(CHAIN_ID_ENV, "fuji")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == CHAIN_ID_ENV));

        let err = Config::from_lookup(lookup(&[(TX_TIMEOUT_ENV, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == TX_TIMEOUT_ENV));

        assert!(Config::from_lookup(lookup(&[(REGISTRY_ADDRESS_ENV, "0x1234")])).is_err());
        assert!(Config::from_lookup(lookup(&[(LOG_FORMAT_ENV, "xml")])).is_err());
    }
}
