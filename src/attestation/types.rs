// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Attestation types.

use alloy::primitives::{Address, Bytes};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minimum claim length, in characters.
pub const CLAIM_MIN_CHARS: usize = 4;

/// Maximum claim length, in characters.
pub const CLAIM_MAX_CHARS: usize = 35;

/// Length of an encoded secp256k1 signature (`r ‖ s ‖ v`).
pub const SIGNATURE_LEN: usize = 65;

/// The two signing parties of an attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Authors the attestation and signs first.
    Verifier,
    /// The recipient named in the attestation; counter-signs.
    Receiver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Verifier => "verifier",
            Role::Receiver => "receiver",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed claim itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationMessage {
    /// Address the claim is about; must counter-sign.
    pub recipient: Address,
    /// Address of the author; must sign first.
    pub verifier: Address,
    /// Last day the attestation is valid.
    pub deadline: NaiveDate,
    /// Whether the verifier may revoke the attestation later.
    pub revocable: bool,
    /// Free-form claim, 4 to 35 characters.
    pub claim: String,
}

impl AttestationMessage {
    /// Address designated for `role`.
    pub fn address_for(&self, role: Role) -> Address {
        match role {
            Role::Verifier => self.verifier,
            Role::Receiver => self.recipient,
        }
    }
}

/// A stored signature over the canonical message bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationSignature {
    /// Address recovered from `signature` when it was produced.
    pub signer: Address,
    /// Raw 65-byte signature.
    pub signature: Bytes,
}

/// An attestation message plus whichever signatures have been collected.
///
/// The message cannot be changed once it is wrapped in a record; a new draft
/// means a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRecord {
    message: AttestationMessage,
    verifier_signature: Option<AttestationSignature>,
    receiver_signature: Option<AttestationSignature>,
}

impl AttestationRecord {
    /// Create an unsigned record.
    pub fn new(message: AttestationMessage) -> Self {
        Self {
            message,
            verifier_signature: None,
            receiver_signature: None,
        }
    }

    /// Attach (or replace) the signature for `role`.
    pub fn with_signature(mut self, role: Role, signature: AttestationSignature) -> Self {
        self.set_signature(role, signature);
        self
    }

    pub(crate) fn set_signature(&mut self, role: Role, signature: AttestationSignature) {
        match role {
            Role::Verifier => self.verifier_signature = Some(signature),
            Role::Receiver => self.receiver_signature = Some(signature),
        }
    }

    pub fn message(&self) -> &AttestationMessage {
        &self.message
    }

    pub fn verifier_signature(&self) -> Option<&AttestationSignature> {
        self.verifier_signature.as_ref()
    }

    pub fn receiver_signature(&self) -> Option<&AttestationSignature> {
        self.receiver_signature.as_ref()
    }

    /// Signature stored for `role`, if any.
    pub fn signature(&self, role: Role) -> Option<&AttestationSignature> {
        match role {
            Role::Verifier => self.verifier_signature(),
            Role::Receiver => self.receiver_signature(),
        }
    }
}

/// Lifecycle status of an attestation.
///
/// Ordered: a later variant is always further along the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Unsigned,
    VerifierSigned,
    BothSigned,
    Registered,
    Minted,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Status::Unsigned => "unsigned",
            Status::VerifierSigned => "verifier_signed",
            Status::BothSigned => "both_signed",
            Status::Registered => "registered",
            Status::Minted => "minted",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_order_follows_lifecycle() {
        assert!(Status::Unsigned < Status::VerifierSigned);
        assert!(Status::VerifierSigned < Status::BothSigned);
        assert!(Status::BothSigned < Status::Registered);
        assert!(Status::Registered < Status::Minted);
    }

    #[test]
    fn role_addresses_come_from_message() {
        let message = AttestationMessage {
            recipient: Address::repeat_byte(0xaa),
            verifier: Address::repeat_byte(0xbb),
            deadline: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            revocable: true,
            claim: "hello world".into(),
        };
        assert_eq!(message.address_for(Role::Receiver), message.recipient);
        assert_eq!(message.address_for(Role::Verifier), message.verifier);
    }
}
