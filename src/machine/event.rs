// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Events and effects exchanged with the machine.

use alloy::primitives::Address;

use crate::attestation::{AttestationMessage, AttestationRecord, AttestationSignature, Role};
use crate::blockchain::{TokenId, TxReceipt};
use crate::error::{ContractError, SignatureError};
use crate::file_transfer::ExportedFile;

/// Kind of asynchronous call a ticket was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Sign,
    Register,
    Mint,
}

/// Handle of a scheduled asynchronous call.
///
/// A completion is honoured only if its ticket is the one the machine is
/// currently waiting for, in the same generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub generation: u64,
    pub call: u64,
    pub kind: CallKind,
}

/// Input to [`OrchestrationMachine::dispatch`](super::OrchestrationMachine::dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    WalletConnected(Address),
    WalletDisconnected,

    GoToCreateFlow,
    GoToClaimFlow,
    GoToHomePage,

    /// Verifier submitted the attestation form.
    FormSubmitted(AttestationMessage),
    /// Verifier asks the wallet to sign the form.
    RequestSignature,
    /// Recipient asks the wallet to counter-sign.
    Sign,
    Download,
    UploadAttestation(Vec<u8>),
    Register,
    Mint,
    /// Mint straight from a fully signed attestation, skipping registration.
    SelfMint,

    SignatureSucceeded {
        ticket: Ticket,
        signature: AttestationSignature,
    },
    SignatureFailed {
        ticket: Ticket,
        error: SignatureError,
    },
    RegisterSucceeded {
        ticket: Ticket,
        receipt: TxReceipt,
    },
    MintSucceeded {
        ticket: Ticket,
        token_id: TokenId,
    },
    TransactionFailed {
        ticket: Ticket,
        error: ContractError,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::WalletConnected(_) => "wallet connected",
            Event::WalletDisconnected => "wallet disconnected",
            Event::GoToCreateFlow => "go to create flow",
            Event::GoToClaimFlow => "go to claim flow",
            Event::GoToHomePage => "go to home page",
            Event::FormSubmitted(_) => "form submitted",
            Event::RequestSignature => "request signature",
            Event::Sign => "sign",
            Event::Download => "download",
            Event::UploadAttestation(_) => "upload attestation",
            Event::Register => "register",
            Event::Mint => "mint",
            Event::SelfMint => "self mint",
            Event::SignatureSucceeded { .. } => "signature succeeded",
            Event::SignatureFailed { .. } => "signature failed",
            Event::RegisterSucceeded { .. } => "tx succeeded (register)",
            Event::MintSucceeded { .. } => "tx succeeded (mint)",
            Event::TransactionFailed { .. } => "tx failed",
        }
    }

    /// Whether this is a completion for a call of `kind`.
    pub fn completes(&self, kind: CallKind) -> bool {
        matches!(
            (self, kind),
            (
                Event::SignatureSucceeded { .. } | Event::SignatureFailed { .. },
                CallKind::Sign
            ) | (Event::RegisterSucceeded { .. }, CallKind::Register)
                | (Event::MintSucceeded { .. }, CallKind::Mint)
                | (
                    Event::TransactionFailed { .. },
                    CallKind::Register | CallKind::Mint
                )
        )
    }

    /// Ticket carried by a completion event.
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Event::SignatureSucceeded { ticket, .. }
            | Event::SignatureFailed { ticket, .. }
            | Event::RegisterSucceeded { ticket, .. }
            | Event::MintSucceeded { ticket, .. }
            | Event::TransactionFailed { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }
}

/// Asynchronous call the caller must run and report back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCall {
    Sign {
        ticket: Ticket,
        role: Role,
        signer: Address,
        payload: Vec<u8>,
    },
    Register {
        ticket: Ticket,
        record: AttestationRecord,
    },
    Mint {
        ticket: Ticket,
        record: AttestationRecord,
    },
}

impl PendingCall {
    pub fn ticket(&self) -> Ticket {
        match self {
            PendingCall::Sign { ticket, .. }
            | PendingCall::Register { ticket, .. }
            | PendingCall::Mint { ticket, .. } => *ticket,
        }
    }
}

/// Work requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run the call and dispatch its completion event.
    Call(PendingCall),
    /// Hand the exported file to the user. No completion event.
    Export(ExportedFile),
}
