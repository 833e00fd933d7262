// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deterministic signer for tests and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use alloy::primitives::{Address, Bytes};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use tokio::sync::Notify;

use super::SignatureService;
use crate::attestation::AttestationSignature;
use crate::error::SignatureError;

/// Signer with a fixed key set and a script of failures.
///
/// Each call first pops the failure queue; when it is empty the call signs
/// with whichever held key controls the requested address.
#[derive(Debug, Default)]
pub struct ScriptedSigner {
    keys: Vec<PrivateKeySigner>,
    failures: Mutex<VecDeque<SignatureError>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key the signer may use.
    pub fn with_key(mut self, key: PrivateKeySigner) -> Self {
        self.keys.push(key);
        self
    }

    /// Hold every call until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: SignatureError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// Number of sign requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SignatureService for ScriptedSigner {
    async fn sign(
        &self,
        payload: &[u8],
        signer: Address,
    ) -> Result<AttestationSignature, SignatureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let scripted = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = scripted {
            return Err(error);
        }

        let key = self
            .keys
            .iter()
            .find(|key| key.address() == signer)
            .ok_or_else(|| SignatureError::SignerUnavailable(format!("no key for {signer}")))?;
        let signature = key
            .sign_message_sync(payload)
            .map_err(|e| SignatureError::SignerUnavailable(e.to_string()))?;

        Ok(AttestationSignature {
            signer,
            signature: Bytes::from(signature.as_bytes().to_vec()),
        })
    }
}
