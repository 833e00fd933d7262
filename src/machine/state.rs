// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hierarchical workflow states.
//!
//! ```text
//! Disconnected
//! Connected
//! ├── Home
//! ├── CreateAttestation
//! │   └── Idle → FormReadyToSign → Signing → FormSigned → CertificationDownloaded
//! └── ClaimEcoId
//!     ├── Idle
//!     └── AttestationLoaded
//!         └── MissingReceiverSignature → Signing → ReceiverSigned
//!             ReadyToRegister ← CallingRegister → Registered
//!             CallingMint → Minted
//! ```

use super::event::CallKind;

/// Top-level state of a workflow session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Disconnected,
    Connected(Page),
}

/// Navigation region inside a connected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    CreateAttestation(CreateStep),
    ClaimEcoId(ClaimStep),
}

/// Verifier path: author, sign and download a new attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateStep {
    Idle,
    FormReadyToSign,
    Signing,
    FormSigned,
    CertificationDownloaded,
}

/// Recipient path: upload, counter-sign, register and mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimStep {
    Idle,
    AttestationLoaded(LoadedStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadedStep {
    MissingReceiverSignature,
    Signing,
    ReceiverSigned,
    ReadyToRegister,
    CallingRegister,
    Registered,
    CallingMint { resume: MintOrigin },
    Minted,
}

/// Where a mint was started from; a failed mint returns there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MintOrigin {
    ReceiverSigned,
    ReadyToRegister,
    Registered,
}

impl MintOrigin {
    pub fn step(self) -> LoadedStep {
        match self {
            MintOrigin::ReceiverSigned => LoadedStep::ReceiverSigned,
            MintOrigin::ReadyToRegister => LoadedStep::ReadyToRegister,
            MintOrigin::Registered => LoadedStep::Registered,
        }
    }
}

impl State {
    pub(crate) fn create(step: CreateStep) -> Self {
        State::Connected(Page::CreateAttestation(step))
    }

    pub(crate) fn loaded(step: LoadedStep) -> Self {
        State::Connected(Page::ClaimEcoId(ClaimStep::AttestationLoaded(step)))
    }

    /// Kind of call this state is waiting on, if any.
    pub fn awaiting(&self) -> Option<CallKind> {
        match self {
            State::Connected(Page::CreateAttestation(CreateStep::Signing))
            | State::Connected(Page::ClaimEcoId(ClaimStep::AttestationLoaded(
                LoadedStep::Signing,
            ))) => Some(CallKind::Sign),
            State::Connected(Page::ClaimEcoId(ClaimStep::AttestationLoaded(
                LoadedStep::CallingRegister,
            ))) => Some(CallKind::Register),
            State::Connected(Page::ClaimEcoId(ClaimStep::AttestationLoaded(
                LoadedStep::CallingMint { .. },
            ))) => Some(CallKind::Mint),
            _ => None,
        }
    }

    /// Whether an asynchronous call is outstanding in this state.
    pub fn is_in_flight(&self) -> bool {
        self.awaiting().is_some()
    }

    /// Dotted path of the state, e.g. `connected.claim_eco_id.attestation_loaded.signing`.
    pub fn path(&self) -> String {
        let page = match self {
            State::Disconnected => return "disconnected".to_string(),
            State::Connected(page) => page,
        };
        let tail = match page {
            Page::Home => "home".to_string(),
            Page::CreateAttestation(step) => {
                let step = match step {
                    CreateStep::Idle => "idle",
                    CreateStep::FormReadyToSign => "form_ready_to_sign",
                    CreateStep::Signing => "signing",
                    CreateStep::FormSigned => "form_signed",
                    CreateStep::CertificationDownloaded => "certification_downloaded",
                };
                format!("create_attestation.{step}")
            }
            Page::ClaimEcoId(ClaimStep::Idle) => "claim_eco_id.idle".to_string(),
            Page::ClaimEcoId(ClaimStep::AttestationLoaded(step)) => {
                let step = match step {
                    LoadedStep::MissingReceiverSignature => "missing_receiver_signature",
                    LoadedStep::Signing => "signing",
                    LoadedStep::ReceiverSigned => "receiver_signed",
                    LoadedStep::ReadyToRegister => "ready_to_register",
                    LoadedStep::CallingRegister => "calling_register",
                    LoadedStep::Registered => "registered",
                    LoadedStep::CallingMint { .. } => "calling_mint",
                    LoadedStep::Minted => "minted",
                };
                format!("claim_eco_id.attestation_loaded.{step}")
            }
        };
        format!("connected.{tail}")
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_states() {
        assert!(State::create(CreateStep::Signing).is_in_flight());
        assert!(State::loaded(LoadedStep::Signing).is_in_flight());
        assert!(State::loaded(LoadedStep::CallingRegister).is_in_flight());
        assert!(State::loaded(LoadedStep::CallingMint {
            resume: MintOrigin::Registered
        })
        .is_in_flight());

        assert!(!State::Disconnected.is_in_flight());
        assert!(!State::create(CreateStep::FormSigned).is_in_flight());
        assert!(!State::loaded(LoadedStep::Registered).is_in_flight());
    }

    #[test]
    fn in_flight_states_name_their_call() {
        assert_eq!(
            State::create(CreateStep::Signing).awaiting(),
            Some(CallKind::Sign)
        );
        assert_eq!(
            State::loaded(LoadedStep::CallingRegister).awaiting(),
            Some(CallKind::Register)
        );
        assert_eq!(
            State::loaded(LoadedStep::CallingMint {
                resume: MintOrigin::ReceiverSigned
            })
            .awaiting(),
            Some(CallKind::Mint)
        );
        assert_eq!(State::Connected(Page::Home).awaiting(), None);
    }

    #[test]
    fn paths_are_dotted() {
        assert_eq!(State::Disconnected.to_string(), "disconnected");
        assert_eq!(
            State::Connected(Page::Home).to_string(),
            "connected.home"
        );
        assert_eq!(
            State::loaded(LoadedStep::MissingReceiverSignature).to_string(),
            "connected.claim_eco_id.attestation_loaded.missing_receiver_signature"
        );
    }
}
