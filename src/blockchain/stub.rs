// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deterministic registry gateway for tests and offline runs.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use alloy::primitives::U256;
use tokio::sync::Notify;

use super::types::{TokenId, TxReceipt};
use super::ContractGateway;
use crate::attestation::{canonical_message_bytes, AttestationRecord};
use crate::error::ContractError;

/// In-memory ledger with scripted failures.
///
/// Token ids are handed out sequentially from the configured start. When
/// `require_registration` is set, minting an unregistered attestation
/// reverts, mirroring a registry that enforces register-before-mint.
#[derive(Debug)]
pub struct ScriptedGateway {
    next_token_id: AtomicU64,
    next_block: AtomicU64,
    require_registration: bool,
    registered: Mutex<HashSet<Vec<u8>>>,
    register_failures: Mutex<VecDeque<ContractError>>,
    mint_failures: Mutex<VecDeque<ContractError>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ScriptedGateway {
    /// Gateway whose first minted token id is `first_token_id`.
    pub fn new(first_token_id: u64) -> Self {
        Self {
            next_token_id: AtomicU64::new(first_token_id),
            next_block: AtomicU64::new(1),
            require_registration: false,
            registered: Mutex::new(HashSet::new()),
            register_failures: Mutex::new(VecDeque::new()),
            mint_failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Revert mints of attestations that were never registered.
    pub fn requiring_registration(mut self) -> Self {
        self.require_registration = true;
        self
    }

    /// Hold every call until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fail_next_register(&self, error: ContractError) {
        self.register_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    pub fn fail_next_mint(&self, error: ContractError) {
        self.mint_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// Number of register and mint calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_registered(&self, record: &AttestationRecord) -> bool {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&canonical_message_bytes(record.message()))
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

fn pop(queue: &Mutex<VecDeque<ContractError>>) -> Option<ContractError> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

impl ContractGateway for ScriptedGateway {
    async fn register(&self, record: &AttestationRecord) -> Result<TxReceipt, ContractError> {
        self.enter().await;
        if let Some(error) = pop(&self.register_failures) {
            return Err(error);
        }

        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(canonical_message_bytes(record.message()));
        let block_number = self.next_block.fetch_add(1, Ordering::SeqCst);

        Ok(TxReceipt {
            tx_hash: format!("0x{block_number:064x}"),
            block_number,
            gas_used: 21_000,
            success: true,
        })
    }

    async fn mint(&self, record: &AttestationRecord) -> Result<TokenId, ContractError> {
        self.enter().await;
        if let Some(error) = pop(&self.mint_failures) {
            return Err(error);
        }
        if self.require_registration && !self.is_registered(record) {
            return Err(ContractError::Revert(
                "attestation is not registered".to_string(),
            ));
        }

        Ok(U256::from(self.next_token_id.fetch_add(1, Ordering::SeqCst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fully_signed_record;

    #[tokio::test]
    async fn mints_sequential_token_ids() {
        let gateway = ScriptedGateway::new(42);
        let record = fully_signed_record();
        assert_eq!(gateway.mint(&record).await, Ok(U256::from(42)));
        assert_eq!(gateway.mint(&record).await, Ok(U256::from(43)));
    }

    #[tokio::test]
    async fn registration_policy_is_enforced_when_required() {
        let gateway = ScriptedGateway::new(1).requiring_registration();
        let record = fully_signed_record();

        assert!(matches!(
            gateway.mint(&record).await,
            Err(ContractError::Revert(_))
        ));
        let receipt = gateway.register(&record).await.unwrap();
        assert!(receipt.success);
        assert!(gateway.is_registered(&record));
        assert_eq!(gateway.mint(&record).await, Ok(U256::from(1)));
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let gateway = ScriptedGateway::default();
        gateway.fail_next_register(ContractError::InsufficientFunds);
        let record = fully_signed_record();

        assert_eq!(
            gateway.register(&record).await,
            Err(ContractError::InsufficientFunds)
        );
        assert!(gateway.register(&record).await.is_ok());
        assert_eq!(gateway.calls(), 2);
    }
}
