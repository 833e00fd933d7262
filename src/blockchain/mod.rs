// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger integration for EcoID registration and minting.
//!
//! This module provides:
//! - The [`ContractGateway`] capability consumed by the workflow
//! - [`RegistryGateway`], an EVM implementation over an alloy HTTP provider
//! - [`ScriptedGateway`], a deterministic stand-in for tests

use std::future::Future;

use crate::attestation::AttestationRecord;
use crate::error::ContractError;

pub mod registry;
pub mod stub;
pub mod types;

pub use registry::RegistryGateway;
pub use stub::ScriptedGateway;
pub use types::*;

/// Submits register and mint transactions for fully signed attestations.
pub trait ContractGateway: Send + Sync {
    /// Record a fully signed attestation on the ledger.
    fn register(
        &self,
        record: &AttestationRecord,
    ) -> impl Future<Output = Result<TxReceipt, ContractError>> + Send;

    /// Mint the EcoID token for an attestation and return its id.
    fn mint(
        &self,
        record: &AttestationRecord,
    ) -> impl Future<Output = Result<TokenId, ContractError>> + Send;
}
