// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Attestation co-signing workflow.
//!
//! [`OrchestrationMachine`] is a pure transition function: it never touches a
//! wallet or a node. Transitions that need one return an [`Effect::Call`]; the
//! caller runs it (see [`crate::runtime`]) and feeds the outcome back as a
//! completion event carrying the call's [`Ticket`].
//!
//! Completions are matched against the outstanding ticket, so a result that
//! arrives after a disconnect, an account switch or a navigation is dropped.

pub mod context;
pub mod event;
pub mod state;

pub use context::WorkflowContext;
pub use event::{CallKind, Effect, Event, PendingCall, Ticket};
pub use state::{ClaimStep, CreateStep, LoadedStep, MintOrigin, Page, State};

use crate::attestation::{
    canonical_message_bytes, check_signature, ensure_fully_signed, validate, validate_message,
    AttestationRecord, AttestationSignature, Role, Status,
};
use crate::error::{PermissionError, StateError, ValidationError, WorkflowError};
use crate::file_transfer::{self, ExportedFile};

/// Why an event was dropped without touching the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A call is outstanding and the event would start another one.
    Busy,
    /// The completion belongs to a call the machine no longer waits for.
    Stale,
}

/// How the machine handled an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    Rejected(WorkflowError),
    Ignored(IgnoreReason),
}

/// Result of [`OrchestrationMachine::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// State after the event.
    pub state: State,
    pub effect: Option<Effect>,
    pub disposition: Disposition,
}

impl Step {
    pub fn is_applied(&self) -> bool {
        self.disposition == Disposition::Applied
    }
}

enum Refusal {
    Rejected(WorkflowError),
    Ignored(IgnoreReason),
}

impl From<WorkflowError> for Refusal {
    fn from(error: WorkflowError) -> Self {
        Refusal::Rejected(error)
    }
}

impl From<ValidationError> for Refusal {
    fn from(error: ValidationError) -> Self {
        Refusal::Rejected(error.into())
    }
}

impl From<PermissionError> for Refusal {
    fn from(error: PermissionError) -> Self {
        Refusal::Rejected(error.into())
    }
}

type Transition = Result<Option<Effect>, Refusal>;

/// One co-signing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationMachine {
    state: State,
    context: WorkflowContext,
}

impl Default for OrchestrationMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestrationMachine {
    /// Create a machine waiting for a wallet.
    pub fn new() -> Self {
        Self {
            state: State::Disconnected,
            context: WorkflowContext::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.context
    }

    /// Lifecycle status of the current attestation.
    pub fn status(&self) -> Status {
        self.context.status()
    }

    /// Apply one event.
    ///
    /// Rejected events leave the state unchanged. Validation and permission
    /// failures are also recorded as the context's last error.
    pub fn dispatch(&mut self, event: Event) -> Step {
        let name = event.name();
        let from = self.state;

        let (effect, disposition) = match self.transition(event) {
            Ok(effect) => (effect, Disposition::Applied),
            Err(Refusal::Rejected(error)) => {
                if !matches!(error, WorkflowError::State(_)) {
                    self.context.set_error(&error);
                }
                (None, Disposition::Rejected(error))
            }
            Err(Refusal::Ignored(reason)) => (None, Disposition::Ignored(reason)),
        };

        match &disposition {
            Disposition::Applied => tracing::debug!(
                event = name,
                from = %from,
                to = %self.state,
                generation = self.context.generation(),
                "Transition applied"
            ),
            Disposition::Rejected(error) => tracing::info!(
                event = name,
                state = %from,
                code = error.error_code(),
                error = %error,
                "Event rejected"
            ),
            Disposition::Ignored(reason) => tracing::debug!(
                event = name,
                state = %from,
                reason = ?reason,
                "Event ignored"
            ),
        }

        Step {
            state: self.state,
            effect,
            disposition,
        }
    }

    fn transition(&mut self, event: Event) -> Transition {
        match event {
            Event::WalletDisconnected => {
                self.context.invalidate();
                self.context.reset();
                self.context.disconnect();
                self.state = State::Disconnected;
                Ok(None)
            }
            // A different account is a different session.
            Event::WalletConnected(address) => {
                self.context.invalidate();
                self.context.reset();
                self.context.connect(address);
                self.state = State::Connected(Page::Home);
                Ok(None)
            }
            event => {
                if let Some(ticket) = event.ticket() {
                    if !self.context.is_outstanding(ticket) {
                        return Err(Refusal::Ignored(IgnoreReason::Stale));
                    }
                    // The ticket stays outstanding unless the completion fits it.
                    if !event.completes(ticket.kind) || self.state.awaiting() != Some(ticket.kind)
                    {
                        return Err(self.not_applicable(&event));
                    }
                    self.context.settle(ticket);
                }
                match self.state {
                    State::Disconnected => Err(self.not_applicable(&event)),
                    State::Connected(page) => self.on_connected(page, event),
                }
            }
        }
    }

    fn on_connected(&mut self, page: Page, event: Event) -> Transition {
        let target = match event {
            Event::GoToHomePage => Some(Page::Home),
            Event::GoToCreateFlow => Some(Page::CreateAttestation(CreateStep::Idle)),
            Event::GoToClaimFlow => Some(Page::ClaimEcoId(ClaimStep::Idle)),
            _ => None,
        };
        if let Some(target) = target {
            self.context.invalidate();
            self.context.reset();
            self.state = State::Connected(target);
            return Ok(None);
        }

        if self.state.is_in_flight() && event.ticket().is_none() {
            return Err(Refusal::Ignored(IgnoreReason::Busy));
        }

        match page {
            Page::Home => Err(self.not_applicable(&event)),
            Page::CreateAttestation(step) => self.on_create(step, event),
            Page::ClaimEcoId(ClaimStep::Idle) => match event {
                Event::UploadAttestation(bytes) => self.load(&bytes),
                event => Err(self.not_applicable(&event)),
            },
            Page::ClaimEcoId(ClaimStep::AttestationLoaded(step)) => self.on_loaded(step, event),
        }
    }

    fn on_create(&mut self, step: CreateStep, event: Event) -> Transition {
        match (step, event) {
            (CreateStep::Idle | CreateStep::FormReadyToSign, Event::FormSubmitted(message)) => {
                validate_message(&message)?;
                self.context.start_record(AttestationRecord::new(message));
                self.state = State::create(CreateStep::FormReadyToSign);
                Ok(None)
            }
            (CreateStep::FormReadyToSign, Event::RequestSignature) => {
                let call = self.request_signature(Role::Verifier)?;
                self.state = State::create(CreateStep::Signing);
                Ok(Some(Effect::Call(call)))
            }
            (CreateStep::Signing, Event::SignatureSucceeded { signature, .. }) => {
                let next = if self.attach_signature(Role::Verifier, signature) {
                    CreateStep::FormSigned
                } else {
                    CreateStep::FormReadyToSign
                };
                self.state = State::create(next);
                Ok(None)
            }
            (CreateStep::Signing, Event::SignatureFailed { error, .. }) => {
                self.context.set_error(&error.into());
                self.state = State::create(CreateStep::FormReadyToSign);
                Ok(None)
            }
            (CreateStep::FormSigned | CreateStep::CertificationDownloaded, Event::Download) => {
                let file = self.export()?;
                self.state = State::create(CreateStep::CertificationDownloaded);
                Ok(Some(Effect::Export(file)))
            }
            (_, event) => Err(self.not_applicable(&event)),
        }
    }

    fn load(&mut self, bytes: &[u8]) -> Transition {
        let record = validate(bytes)?;
        let step = loaded_step_for(&record)?;
        self.context.start_record(record);
        self.state = State::loaded(step);
        Ok(None)
    }

    fn on_loaded(&mut self, step: LoadedStep, event: Event) -> Transition {
        use LoadedStep::*;

        match (step, event) {
            (MissingReceiverSignature, Event::Sign) => {
                let call = self.request_signature(Role::Receiver)?;
                self.state = State::loaded(Signing);
                Ok(Some(Effect::Call(call)))
            }
            (Signing, Event::SignatureSucceeded { signature, .. }) => {
                let next = if self.attach_signature(Role::Receiver, signature) {
                    ReceiverSigned
                } else {
                    MissingReceiverSignature
                };
                self.state = State::loaded(next);
                Ok(None)
            }
            (Signing, Event::SignatureFailed { error, .. }) => {
                self.context.set_error(&error.into());
                self.state = State::loaded(MissingReceiverSignature);
                Ok(None)
            }
            (ReceiverSigned | ReadyToRegister, Event::Download) => {
                Ok(Some(Effect::Export(self.export()?)))
            }
            (ReceiverSigned | ReadyToRegister, Event::Register) => {
                let record = self.fully_signed_record()?;
                let ticket = self.context.begin_call(CallKind::Register);
                self.state = State::loaded(CallingRegister);
                Ok(Some(Effect::Call(PendingCall::Register { ticket, record })))
            }
            (ReceiverSigned, Event::SelfMint) => self.start_mint(MintOrigin::ReceiverSigned),
            (ReadyToRegister, Event::SelfMint) => self.start_mint(MintOrigin::ReadyToRegister),
            (Registered, Event::Mint) => self.start_mint(MintOrigin::Registered),
            (CallingRegister, Event::RegisterSucceeded { receipt, .. }) => {
                tracing::info!(tx_hash = %receipt.tx_hash, block = receipt.block_number, "Attestation registered");
                self.context.set_registration(receipt);
                self.state = State::loaded(Registered);
                Ok(None)
            }
            (CallingRegister, Event::TransactionFailed { error, .. }) => {
                self.context.set_error(&error.into());
                self.state = State::loaded(ReadyToRegister);
                Ok(None)
            }
            (CallingMint { .. }, Event::MintSucceeded { token_id, .. }) => {
                tracing::info!(token_id = %token_id, "EcoID minted");
                self.context.set_token_id(token_id);
                self.state = State::loaded(Minted);
                Ok(None)
            }
            (CallingMint { resume }, Event::TransactionFailed { error, .. }) => {
                self.context.set_error(&error.into());
                self.state = State::loaded(resume.step());
                Ok(None)
            }
            (_, event) => Err(self.not_applicable(&event)),
        }
    }

    fn start_mint(&mut self, resume: MintOrigin) -> Transition {
        let record = self.fully_signed_record()?;
        let ticket = self.context.begin_call(CallKind::Mint);
        self.state = State::loaded(LoadedStep::CallingMint { resume });
        Ok(Some(Effect::Call(PendingCall::Mint { ticket, record })))
    }

    /// Build the signature request for `role` after checking the wallet.
    fn request_signature(&mut self, role: Role) -> Result<PendingCall, Refusal> {
        let record = self.current_record()?;
        if role == Role::Receiver {
            check_signature(record, Role::Verifier)?;
        }
        let signer = record.message().address_for(role);
        let payload = canonical_message_bytes(record.message());

        self.require_account(role, signer)?;
        self.context.clear_error();
        let ticket = self.context.begin_call(CallKind::Sign);
        Ok(PendingCall::Sign {
            ticket,
            role,
            signer,
            payload,
        })
    }

    fn require_account(
        &self,
        role: Role,
        expected: alloy::primitives::Address,
    ) -> Result<(), PermissionError> {
        match self.context.connected_address() {
            None => Err(PermissionError::NotConnected),
            Some(connected) if connected == expected => Ok(()),
            Some(connected) => Err(PermissionError::WrongAccount {
                role,
                expected,
                connected,
            }),
        }
    }

    /// Store `signature` for `role` if it verifies. Returns whether it did.
    fn attach_signature(&mut self, role: Role, signature: AttestationSignature) -> bool {
        let Some(record) = self.context.record() else {
            return false;
        };
        let candidate = record.clone().with_signature(role, signature);
        match check_signature(&candidate, role) {
            Ok(()) => {
                self.context.update_record(candidate);
                self.context.clear_error();
                true
            }
            Err(error) => {
                tracing::warn!(role = %role, error = %error, "Wallet returned an unusable signature");
                self.context.set_error(&error.into());
                false
            }
        }
    }

    fn fully_signed_record(&mut self) -> Result<AttestationRecord, Refusal> {
        let record = self.current_record()?.clone();
        ensure_fully_signed(&record)?;
        self.context.clear_error();
        Ok(record)
    }

    fn export(&self) -> Result<ExportedFile, Refusal> {
        let record = self.current_record()?;
        file_transfer::export(record)
            .map_err(|e| ValidationError::Malformed(format!("cannot encode attestation: {e}")).into())
    }

    fn current_record(&self) -> Result<&AttestationRecord, Refusal> {
        self.context.record().ok_or_else(|| {
            Refusal::Rejected(
                StateError {
                    event: "attestation lookup",
                    state: self.state.path(),
                }
                .into(),
            )
        })
    }

    fn not_applicable(&self, event: &Event) -> Refusal {
        Refusal::Rejected(
            StateError {
                event: event.name(),
                state: self.state.path(),
            }
            .into(),
        )
    }
}

/// Sub-state a freshly uploaded record enters.
///
/// The verifier signature must always verify; a receiver signature, when
/// present, must verify too.
fn loaded_step_for(record: &AttestationRecord) -> Result<LoadedStep, ValidationError> {
    check_signature(record, Role::Verifier)?;
    match record.receiver_signature() {
        None => Ok(LoadedStep::MissingReceiverSignature),
        Some(_) => {
            check_signature(record, Role::Receiver)?;
            Ok(LoadedStep::ReceiverSigned)
        }
    }
}
