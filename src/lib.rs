// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EcoID Attest - Attestation Co-Signing Workflow
//!
//! A verifier authors and signs an attestation about a recipient, hands the
//! exported file over, and the recipient counter-signs it before registering
//! it on-chain and minting it as an EcoID.
//!
//! ## Modules
//!
//! - `attestation` - Attestation record, document format and validation
//! - `file_transfer` - Export and import of attestation files
//! - `wallet` - Message signing (local key, scripted stand-in)
//! - `blockchain` - Registry contract gateway (alloy)
//! - `machine` - Workflow state machine
//! - `runtime` - Runs the machine's effects with timeouts
//! - `config` - Environment configuration
//! - `telemetry` - Tracing setup

pub mod attestation;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod file_transfer;
pub mod machine;
pub mod runtime;
pub mod telemetry;
pub mod wallet;

#[cfg(test)]
mod test_support;
