// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::U256;
use url::Url;

/// Identifier of a minted EcoID token.
pub type TokenId = U256;

/// EVM network the registry contract lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: Url,
}

/// Avalanche Fuji testnet RPC endpoint.
pub const FUJI_RPC_URL: &str = "https://api.avax-test.network/ext/bc/C/rpc";

/// Avalanche Fuji testnet chain id.
pub const FUJI_CHAIN_ID: u64 = 43113;

impl NetworkConfig {
    pub fn new(name: impl Into<String>, chain_id: u64, rpc_url: Url) -> Self {
        Self {
            name: name.into(),
            chain_id,
            rpc_url,
        }
    }

    /// Avalanche Fuji testnet.
    pub fn fuji() -> Self {
        Self {
            name: "Avalanche Fuji Testnet".to_string(),
            chain_id: FUJI_CHAIN_ID,
            rpc_url: Url::parse(FUJI_RPC_URL).expect("static URL is valid"),
        }
    }
}

/// Transaction receipt after confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}
