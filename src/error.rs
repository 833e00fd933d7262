// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Workflow Error Taxonomy
//!
//! | Error | Raised by | Leaves the machine |
//! |-------|-----------|--------------------|
//! | [`ValidationError`] | parsing, form submission, signature checks | in the pre-call state |
//! | [`PermissionError`] | role guards on signing | in the pre-call state |
//! | [`SignatureError`] | the wallet signer | in the nearest retryable state |
//! | [`ContractError`] | the registry gateway | in the nearest retryable state |
//! | [`StateError`] | events that do not apply to the current state | unchanged |
//!
//! Nothing here is fatal. The machine stores an [`ErrorInfo`] snapshot in its
//! context and waits for the user to retry or navigate away.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attestation::Role;

/// Malformed or out-of-range input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Malformed attestation: {0}")]
    Malformed(String),

    #[error("Invalid `{field}` address: {reason}")]
    InvalidAddress { field: &'static str, reason: String },

    #[error("Invalid deadline `{0}` (expected YYYY-MM-DD)")]
    InvalidDeadline(String),

    #[error("Claim must be {min} to {max} characters long (got {actual})")]
    ClaimLength { actual: usize, min: usize, max: usize },

    #[error("Invalid {role} signature encoding: {reason}")]
    SignatureFormat { role: Role, reason: String },

    #[error("The {role} signature is missing")]
    MissingSignature { role: Role },

    #[error("The {role} signature was not produced by the {role} address")]
    SignatureMismatch { role: Role },
}

/// The connected wallet cannot act in the role an action requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("No wallet is connected")]
    NotConnected,

    #[error("Connected wallet {connected} is not the {role} of this attestation ({expected})")]
    WrongAccount {
        role: Role,
        expected: Address,
        connected: Address,
    },
}

/// Failures reported by the wallet signer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Signature request rejected by the user")]
    UserRejected,

    #[error("Signer unavailable: {0}")]
    SignerUnavailable(String),

    #[error("Signature request timed out")]
    Timeout,
}

/// Failures reported by the registry contract gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("Transaction reverted: {0}")]
    Revert(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Insufficient funds to pay for the transaction")]
    InsufficientFunds,

    #[error("Transaction timed out")]
    Timeout,
}

/// An event that has no meaning in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Event `{event}` is not valid in state {state}")]
pub struct StateError {
    pub event: &'static str,
    pub state: String,
}

/// Any error the orchestration machine can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl WorkflowError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation_error",
            WorkflowError::Permission(_) => "permission_error",
            WorkflowError::Signature(SignatureError::UserRejected) => "signature_user_rejected",
            WorkflowError::Signature(SignatureError::SignerUnavailable(_)) => {
                "signature_signer_unavailable"
            }
            WorkflowError::Signature(SignatureError::Timeout) => "signature_timeout",
            WorkflowError::Contract(ContractError::Revert(_)) => "contract_revert",
            WorkflowError::Contract(ContractError::NetworkError(_)) => "contract_network_error",
            WorkflowError::Contract(ContractError::InsufficientFunds) => {
                "contract_insufficient_funds"
            }
            WorkflowError::Contract(ContractError::Timeout) => "contract_timeout",
            WorkflowError::State(_) => "state_error",
        }
    }
}

/// Snapshot of the last user-visible error, as kept in the workflow context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl From<&WorkflowError> for ErrorInfo {
    fn from(error: &WorkflowError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}
