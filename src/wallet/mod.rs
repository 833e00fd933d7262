// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet signing capability.
//!
//! The workflow never touches keys directly. It asks a [`SignatureService`]
//! to sign the canonical attestation bytes on behalf of an address, and the
//! service answers with a signature or one of the [`SignatureError`] kinds.
//!
//! - `keys` - PEM / hex private key loading
//! - `local` - [`LocalWallet`], backed by an in-process secp256k1 key
//! - `stub` - [`ScriptedSigner`], a deterministic signer for tests

use std::future::Future;

use alloy::primitives::Address;

use crate::attestation::AttestationSignature;
use crate::error::SignatureError;

pub mod keys;
pub mod local;
pub mod stub;

pub use keys::{signer_from_hex, signer_from_key_file, signer_from_pem, KeyError};
pub use local::LocalWallet;
pub use stub::ScriptedSigner;

/// Produces EIP-191 signatures on behalf of a wallet address.
pub trait SignatureService: Send + Sync {
    /// Sign `payload` with the key controlling `signer`.
    ///
    /// The returned signature's `signer` is the address recovered from it.
    fn sign(
        &self,
        payload: &[u8],
        signer: Address,
    ) -> impl Future<Output = Result<AttestationSignature, SignatureError>> + Send;
}
