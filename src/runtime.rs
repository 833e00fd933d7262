// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drives an [`OrchestrationMachine`] against real services.
//!
//! [`EffectExecutor`] turns a [`PendingCall`] into its completion event,
//! bounding every call with a timeout. [`Session`] owns one machine and
//! either runs calls inline ([`Session::send`]) or as background tasks
//! ([`Session::run`]) so that user events keep flowing while a wallet or
//! the chain is busy.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::blockchain::ContractGateway;
use crate::error::{ContractError, SignatureError};
use crate::machine::{Effect, Event, OrchestrationMachine, PendingCall, Step};
use crate::wallet::SignatureService;

/// Default bound on a wallet signature request.
pub const DEFAULT_SIGNATURE_TIMEOUT: Duration = Duration::from_secs(120);

/// Default bound on submitting a transaction and waiting for its receipt.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub signature: Duration,
    pub transaction: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            signature: DEFAULT_SIGNATURE_TIMEOUT,
            transaction: DEFAULT_TX_TIMEOUT,
        }
    }
}

/// Runs pending calls against a signature service and a contract gateway.
pub struct EffectExecutor<S, G> {
    signer: Arc<S>,
    gateway: Arc<G>,
    timeouts: Timeouts,
}

impl<S, G> Clone for EffectExecutor<S, G> {
    fn clone(&self) -> Self {
        Self {
            signer: Arc::clone(&self.signer),
            gateway: Arc::clone(&self.gateway),
            timeouts: self.timeouts,
        }
    }
}

impl<S, G> EffectExecutor<S, G>
where
    S: SignatureService,
    G: ContractGateway,
{
    pub fn new(signer: Arc<S>, gateway: Arc<G>, timeouts: Timeouts) -> Self {
        Self {
            signer,
            gateway,
            timeouts,
        }
    }

    /// Run `call` and return the completion event for it.
    ///
    /// Never fails: errors and timeouts become failure events.
    pub async fn execute(&self, call: PendingCall) -> Event {
        match call {
            PendingCall::Sign {
                ticket,
                role,
                signer,
                payload,
            } => {
                tracing::info!(role = %role, signer = %signer, "Requesting signature");
                let result =
                    tokio::time::timeout(self.timeouts.signature, self.signer.sign(&payload, signer))
                        .await
                        .unwrap_or(Err(SignatureError::Timeout));
                match result {
                    Ok(signature) => Event::SignatureSucceeded { ticket, signature },
                    Err(error) => {
                        tracing::warn!(role = %role, error = %error, "Signature request failed");
                        Event::SignatureFailed { ticket, error }
                    }
                }
            }
            PendingCall::Register { ticket, record } => {
                let result =
                    tokio::time::timeout(self.timeouts.transaction, self.gateway.register(&record))
                        .await
                        .unwrap_or(Err(ContractError::Timeout));
                match result {
                    Ok(receipt) => Event::RegisterSucceeded { ticket, receipt },
                    Err(error) => {
                        tracing::warn!(error = %error, "Register transaction failed");
                        Event::TransactionFailed { ticket, error }
                    }
                }
            }
            PendingCall::Mint { ticket, record } => {
                let result =
                    tokio::time::timeout(self.timeouts.transaction, self.gateway.mint(&record))
                        .await
                        .unwrap_or(Err(ContractError::Timeout));
                match result {
                    Ok(token_id) => Event::MintSucceeded { ticket, token_id },
                    Err(error) => {
                        tracing::warn!(error = %error, "Mint transaction failed");
                        Event::TransactionFailed { ticket, error }
                    }
                }
            }
        }
    }
}

/// One workflow session: a machine plus the services its calls run against.
pub struct Session<S, G> {
    id: Uuid,
    machine: OrchestrationMachine,
    executor: EffectExecutor<S, G>,
}

impl<S, G> Session<S, G>
where
    S: SignatureService + 'static,
    G: ContractGateway + 'static,
{
    pub fn new(executor: EffectExecutor<S, G>) -> Self {
        Self {
            id: Uuid::new_v4(),
            machine: OrchestrationMachine::new(),
            executor,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn machine(&self) -> &OrchestrationMachine {
        &self.machine
    }

    /// Dispatch `event` and run any call it schedules to completion.
    ///
    /// Returns every step taken, in order, including the ones produced by
    /// completion events.
    pub async fn send(&mut self, event: Event) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut next = Some(event);

        while let Some(event) = next.take() {
            let step = self.machine.dispatch(event);
            if let Some(Effect::Call(call)) = &step.effect {
                next = Some(self.executor.execute(call.clone()).await);
            }
            steps.push(step);
        }

        steps
    }

    /// Process events from `inbox` until it closes or `shutdown` fires.
    ///
    /// Calls run on spawned tasks and their completions are fed back into the
    /// machine, so a disconnect or navigation can overtake a slow call. Every
    /// step is reported on `outbox`. Returns the machine in its final state.
    pub async fn run(
        mut self,
        mut inbox: mpsc::Receiver<Event>,
        outbox: mpsc::UnboundedSender<Step>,
        shutdown: CancellationToken,
    ) -> OrchestrationMachine {
        let (completion_tx, mut completions) = mpsc::unbounded_channel::<Event>();

        tracing::info!(session = %self.id, "Workflow session started");

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(session = %self.id, "Workflow session shutting down");
                    break;
                }
                Some(event) = completions.recv() => event,
                received = inbox.recv() => match received {
                    Some(event) => event,
                    None => {
                        tracing::info!(session = %self.id, "Event channel closed");
                        break;
                    }
                },
            };

            let step = self.machine.dispatch(event);

            if let Some(Effect::Call(call)) = &step.effect {
                let executor = self.executor.clone();
                let completion_tx = completion_tx.clone();
                let call = call.clone();
                tokio::spawn(async move {
                    let event = executor.execute(call).await;
                    // The session may already be gone.
                    let _ = completion_tx.send(event);
                });
            }

            if outbox.send(step).is_err() {
                tracing::debug!(session = %self.id, "Step receiver dropped");
            }
        }

        self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::Status;
    use crate::blockchain::ScriptedGateway;
    use crate::file_transfer;
    use crate::machine::{CreateStep, Disposition, IgnoreReason, LoadedStep, State};
    use crate::test_support::{
        fully_signed_record, recipient_key, sample_message, verifier_key, verifier_signed_record,
    };
    use crate::wallet::{LocalWallet, ScriptedSigner};
    use alloy::primitives::U256;
    use tokio::sync::Notify;

    fn session<S, G>(signer: S, gateway: G, timeouts: Timeouts) -> Session<S, G>
    where
        S: SignatureService + 'static,
        G: ContractGateway + 'static,
    {
        Session::new(EffectExecutor::new(
            Arc::new(signer),
            Arc::new(gateway),
            timeouts,
        ))
    }

    #[tokio::test]
    async fn create_flow_with_local_wallet() {
        let wallet = LocalWallet::new(verifier_key());
        let address = wallet.address();
        let mut session = session(wallet, ScriptedGateway::default(), Timeouts::default());

        session.send(Event::WalletConnected(address)).await;
        session.send(Event::GoToCreateFlow).await;
        session.send(Event::FormSubmitted(sample_message())).await;
        let steps = session.send(Event::RequestSignature).await;

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].state, State::create(CreateStep::Signing));
        assert_eq!(steps[1].state, State::create(CreateStep::FormSigned));
        assert_eq!(session.machine().status(), Status::VerifierSigned);
    }

    #[tokio::test]
    async fn claim_flow_end_to_end() {
        let recipient = recipient_key();
        let signer = ScriptedSigner::new().with_key(recipient.clone());
        let mut session = session(signer, ScriptedGateway::new(7), Timeouts::default());

        session.send(Event::WalletConnected(recipient.address())).await;
        session.send(Event::GoToClaimFlow).await;
        let bytes = file_transfer::export(&verifier_signed_record())
            .unwrap()
            .bytes;
        session.send(Event::UploadAttestation(bytes)).await;
        assert_eq!(session.machine().status(), Status::VerifierSigned);

        session.send(Event::Sign).await;
        assert_eq!(session.machine().status(), Status::BothSigned);

        session.send(Event::Register).await;
        assert_eq!(session.machine().status(), Status::Registered);
        assert!(session.machine().context().registration().is_some());

        session.send(Event::Mint).await;
        assert_eq!(session.machine().state(), State::loaded(LoadedStep::Minted));
        assert_eq!(session.machine().status(), Status::Minted);
        assert_eq!(session.machine().context().token_id(), Some(U256::from(7)));
    }

    #[tokio::test]
    async fn signature_timeout_returns_to_form() {
        let signer = ScriptedSigner::new()
            .with_key(verifier_key())
            .gated(Arc::new(Notify::new()));
        let timeouts = Timeouts {
            signature: Duration::from_millis(20),
            ..Timeouts::default()
        };
        let mut session = session(signer, ScriptedGateway::default(), timeouts);

        session.send(Event::WalletConnected(verifier_key().address())).await;
        session.send(Event::GoToCreateFlow).await;
        session.send(Event::FormSubmitted(sample_message())).await;
        let steps = session.send(Event::RequestSignature).await;

        let last = steps.last().unwrap();
        assert_eq!(last.state, State::create(CreateStep::FormReadyToSign));
        assert_eq!(
            session.machine().context().last_error().map(|e| e.code.as_str()),
            Some("signature_timeout")
        );
    }

    #[tokio::test]
    async fn created_file_is_claimed_and_minted() {
        let verifier = LocalWallet::new(verifier_key());
        let verifier_address = verifier.address();
        let unused_ledger = Arc::new(ScriptedGateway::default());
        let mut author = Session::new(EffectExecutor::new(
            Arc::new(verifier),
            Arc::clone(&unused_ledger),
            Timeouts::default(),
        ));

        author.send(Event::WalletConnected(verifier_address)).await;
        author.send(Event::GoToCreateFlow).await;
        author.send(Event::FormSubmitted(sample_message())).await;
        author.send(Event::RequestSignature).await;
        let steps = author.send(Event::Download).await;
        let Some(Effect::Export(file)) = steps.last().and_then(|step| step.effect.clone()) else {
            panic!("expected an export, got {steps:?}");
        };

        assert_eq!(unused_ledger.calls(), 0, "authoring never calls the ledger");

        let recipient = recipient_key();
        assert_eq!(
            file.file_name,
            format!("attestation-{}", recipient.address().to_checksum(None))
        );

        let signer = ScriptedSigner::new().with_key(recipient.clone());
        let mut claimant = session(signer, ScriptedGateway::new(42), Timeouts::default());
        claimant.send(Event::WalletConnected(recipient.address())).await;
        claimant.send(Event::GoToClaimFlow).await;
        claimant.send(Event::UploadAttestation(file.bytes)).await;
        assert_eq!(
            claimant.machine().state(),
            State::loaded(LoadedStep::MissingReceiverSignature)
        );

        claimant.send(Event::Sign).await;
        assert_eq!(
            claimant.machine().state(),
            State::loaded(LoadedStep::ReceiverSigned)
        );
        claimant.send(Event::Register).await;
        assert_eq!(claimant.machine().state(), State::loaded(LoadedStep::Registered));
        claimant.send(Event::Mint).await;

        assert_eq!(claimant.machine().state(), State::loaded(LoadedStep::Minted));
        assert_eq!(claimant.machine().status(), Status::Minted);
        assert_eq!(
            claimant.machine().context().token_id(),
            Some(U256::from(42))
        );
    }

    #[tokio::test]
    async fn transaction_timeout_returns_to_the_prior_step() {
        let recipient = recipient_key();
        let gateway = ScriptedGateway::default().gated(Arc::new(Notify::new()));
        let timeouts = Timeouts {
            transaction: Duration::from_millis(20),
            ..Timeouts::default()
        };
        let signer = ScriptedSigner::new().with_key(recipient.clone());
        let mut session = session(signer, gateway, timeouts);

        session.send(Event::WalletConnected(recipient.address())).await;
        session.send(Event::GoToClaimFlow).await;
        let bytes = file_transfer::export(&fully_signed_record()).unwrap().bytes;
        session.send(Event::UploadAttestation(bytes)).await;

        let steps = session.send(Event::Register).await;
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].state, State::loaded(LoadedStep::CallingRegister));
        assert_eq!(steps[1].state, State::loaded(LoadedStep::ReadyToRegister));
        assert_eq!(
            session.machine().context().last_error().map(|e| e.code.as_str()),
            Some("contract_timeout")
        );

        let steps = session.send(Event::SelfMint).await;
        assert_eq!(
            steps.last().map(|step| step.state),
            Some(State::loaded(LoadedStep::ReadyToRegister))
        );
        assert_eq!(
            session.machine().context().last_error().map(|e| e.code.as_str()),
            Some("contract_timeout")
        );
        assert_eq!(session.machine().context().token_id(), None);
    }

    #[tokio::test]
    async fn run_drops_results_that_arrive_after_disconnect() {
        let recipient = recipient_key();
        let gate = Arc::new(Notify::new());
        let gateway = ScriptedGateway::default().gated(Arc::clone(&gate));
        let signer = ScriptedSigner::new().with_key(recipient.clone());
        let session = session(signer, gateway, Timeouts::default());

        let (events, inbox) = mpsc::channel(8);
        let (outbox, mut steps) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(session.run(inbox, outbox, shutdown.clone()));

        let record = fully_signed_record();
        let bytes = file_transfer::export(&record).unwrap().bytes;
        for event in [
            Event::WalletConnected(recipient.address()),
            Event::GoToClaimFlow,
            Event::UploadAttestation(bytes),
            Event::Register,
        ] {
            events.send(event).await.unwrap();
        }
        for _ in 0..3 {
            steps.recv().await.unwrap();
        }
        let calling = steps.recv().await.unwrap();
        assert_eq!(calling.state, State::loaded(LoadedStep::CallingRegister));

        events.send(Event::WalletDisconnected).await.unwrap();
        let disconnected = steps.recv().await.unwrap();
        assert_eq!(disconnected.state, State::Disconnected);

        gate.notify_one();
        let late = steps.recv().await.unwrap();
        assert_eq!(late.disposition, Disposition::Ignored(IgnoreReason::Stale));

        shutdown.cancel();
        let machine = handle.await.unwrap();
        assert_eq!(machine.state(), State::Disconnected);
        assert!(machine.context().registration().is_none());
    }
}
