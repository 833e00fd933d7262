// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Private key loading.
//!
//! Keys are accepted either as PEM (PKCS#8 or SEC1) or as a 64 character hex
//! string with an optional `0x` prefix.

use std::path::Path;

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Failed to read key file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
}

/// Parse a private key from PEM format to hex string.
///
/// Returns the hex-encoded key (64 characters, no 0x prefix).
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, KeyError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| KeyError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| KeyError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| KeyError::InvalidPrivateKey(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a hex private key, with or without `0x`.
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, KeyError> {
    let trimmed = private_key_hex.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let key_bytes =
        alloy::hex::decode(digits).map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))
}

/// Create a signer from PEM-encoded private key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, KeyError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    signer_from_hex(&hex_key)
}

/// Load a signer from a file holding either a PEM block or a hex key.
pub fn signer_from_key_file(path: &Path) -> Result<PrivateKeySigner, KeyError> {
    let contents = std::fs::read(path)?;
    if contents.starts_with(b"-----BEGIN") {
        signer_from_pem(&contents)
    } else {
        let text = std::str::from_utf8(&contents)
            .map_err(|e| KeyError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;
        signer_from_hex(text)
    }
}
