// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-session workflow context.

use alloy::primitives::Address;

use super::event::{CallKind, Ticket};
use crate::attestation::{derive_status, AttestationRecord, Status};
use crate::blockchain::{TokenId, TxReceipt};
use crate::error::{ErrorInfo, WorkflowError};

/// Data owned by one machine instance.
///
/// Only the machine's transition function writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowContext {
    record: Option<AttestationRecord>,
    connected_address: Option<Address>,
    last_error: Option<ErrorInfo>,
    generation: u64,
    next_call: u64,
    pending: Option<Ticket>,
    registration: Option<TxReceipt>,
    token_id: Option<TokenId>,
}

impl WorkflowContext {
    pub fn record(&self) -> Option<&AttestationRecord> {
        self.record.as_ref()
    }

    /// Address of the currently connected wallet.
    pub fn connected_address(&self) -> Option<Address> {
        self.connected_address
    }

    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    /// Counter bumped whenever in-flight calls must be disregarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ticket of the outstanding call, if any.
    pub fn pending(&self) -> Option<Ticket> {
        self.pending
    }

    /// Receipt of the register transaction, once confirmed.
    pub fn registration(&self) -> Option<&TxReceipt> {
        self.registration.as_ref()
    }

    /// Id of the minted EcoID, once confirmed.
    pub fn token_id(&self) -> Option<TokenId> {
        self.token_id
    }

    /// Lifecycle status of the current record.
    ///
    /// Ledger results only count once both signatures verify.
    pub fn status(&self) -> Status {
        let Some(record) = &self.record else {
            return Status::Unsigned;
        };
        match derive_status(record) {
            Status::BothSigned if self.token_id.is_some() => Status::Minted,
            Status::BothSigned if self.registration.is_some() => Status::Registered,
            status => status,
        }
    }

    pub(super) fn connect(&mut self, address: Address) {
        self.connected_address = Some(address);
    }

    pub(super) fn disconnect(&mut self) {
        self.connected_address = None;
    }

    /// Drop every in-flight call.
    pub(super) fn invalidate(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    /// Forget the current attestation and everything derived from it.
    pub(super) fn reset(&mut self) {
        self.record = None;
        self.last_error = None;
        self.registration = None;
        self.token_id = None;
    }

    pub(super) fn start_record(&mut self, record: AttestationRecord) {
        self.reset();
        self.record = Some(record);
    }

    /// Swap in a new revision of the current record, keeping ledger results.
    pub(super) fn update_record(&mut self, record: AttestationRecord) {
        self.record = Some(record);
    }

    pub(super) fn set_error(&mut self, error: &WorkflowError) {
        self.last_error = Some(ErrorInfo::from(error));
    }

    pub(super) fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub(super) fn set_registration(&mut self, receipt: TxReceipt) {
        self.registration = Some(receipt);
    }

    pub(super) fn set_token_id(&mut self, token_id: TokenId) {
        self.token_id = Some(token_id);
    }

    /// Issue the ticket for a new call.
    pub(super) fn begin_call(&mut self, kind: CallKind) -> Ticket {
        self.next_call += 1;
        let ticket = Ticket {
            generation: self.generation,
            call: self.next_call,
            kind,
        };
        self.pending = Some(ticket);
        ticket
    }

    /// Whether `ticket` is the outstanding call of the current generation.
    pub(super) fn is_outstanding(&self, ticket: Ticket) -> bool {
        ticket.generation == self.generation && self.pending == Some(ticket)
    }

    /// Accept a completion for `ticket` if it is the outstanding call.
    pub(super) fn settle(&mut self, ticket: Ticket) -> bool {
        if self.is_outstanding(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}
