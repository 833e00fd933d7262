// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process wallet backed by a secp256k1 private key.

use std::path::Path;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, Bytes},
    signers::{local::PrivateKeySigner, SignerSync},
};

use super::keys::{signer_from_key_file, KeyError};
use super::SignatureService;
use crate::attestation::AttestationSignature;
use crate::error::SignatureError;

/// Wallet holding a single local key.
#[derive(Debug, Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// Load the wallet key from a PEM or hex key file.
    pub fn from_key_file(path: &Path) -> Result<Self, KeyError> {
        Ok(Self::new(signer_from_key_file(path)?))
    }

    /// Address controlled by this wallet.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Transaction-signing wallet for the same key.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl SignatureService for LocalWallet {
    async fn sign(
        &self,
        payload: &[u8],
        signer: Address,
    ) -> Result<AttestationSignature, SignatureError> {
        if signer != self.address() {
            return Err(SignatureError::SignerUnavailable(format!(
                "wallet controls {}, not {}",
                self.address(),
                signer
            )));
        }

        let signature = self
            .signer
            .sign_message_sync(payload)
            .map_err(|e| SignatureError::SignerUnavailable(e.to_string()))?;
        let recovered = signature
            .recover_address_from_msg(payload)
            .map_err(|e| SignatureError::SignerUnavailable(e.to_string()))?;

        tracing::debug!(signer = %recovered, "Signed attestation payload");

        Ok(AttestationSignature {
            signer: recovered,
            signature: Bytes::from(signature.as_bytes().to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::{canonical_message_bytes, recover_signer};
    use crate::test_support::{recipient_key, sample_message, verifier_key};

    #[tokio::test]
    async fn signs_for_its_own_address() {
        let wallet = LocalWallet::new(verifier_key());
        let message = sample_message();
        let payload = canonical_message_bytes(&message);

        let signature = wallet.sign(&payload, wallet.address()).await.unwrap();
        assert_eq!(signature.signer, wallet.address());
        assert_eq!(
            recover_signer(&message, &signature.signature),
            Some(wallet.address())
        );
    }

    #[tokio::test]
    async fn refuses_foreign_addresses() {
        let wallet = LocalWallet::new(verifier_key());
        let err = wallet
            .sign(b"payload", recipient_key().address())
            .await
            .unwrap_err();
        assert!(matches!(err, SignatureError::SignerUnavailable(_)));
    }
}
