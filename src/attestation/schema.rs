// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Portable attestation document.
//!
//! This is the exported file format. All fields are plain strings so that
//! parsing and field validation stay separate steps:
//!
//! ```text
//! {
//!   "message": { "recipient", "verifier", "deadline", "revocable", "claim" },
//!   "signatures": {
//!     "verifier": { "signer", "signature" },   // optional
//!     "receiver": { "signer", "signature" }    // optional
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::types::{AttestationMessage, AttestationRecord, AttestationSignature};

/// Date format used for `deadline`.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttestationDocument {
    pub message: MessageDocument,
    #[serde(default)]
    pub signatures: SignaturesDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageDocument {
    pub recipient: String,
    pub verifier: String,
    pub deadline: String,
    pub revocable: bool,
    pub claim: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignaturesDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<SignatureDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<SignatureDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignatureDocument {
    pub signer: String,
    pub signature: String,
}

impl From<&AttestationMessage> for MessageDocument {
    fn from(message: &AttestationMessage) -> Self {
        Self {
            recipient: message.recipient.to_checksum(None),
            verifier: message.verifier.to_checksum(None),
            deadline: message.deadline.format(DEADLINE_FORMAT).to_string(),
            revocable: message.revocable,
            claim: message.claim.clone(),
        }
    }
}

impl From<&AttestationSignature> for SignatureDocument {
    fn from(signature: &AttestationSignature) -> Self {
        Self {
            signer: signature.signer.to_checksum(None),
            signature: alloy::hex::encode_prefixed(&signature.signature),
        }
    }
}

impl From<&AttestationRecord> for AttestationDocument {
    fn from(record: &AttestationRecord) -> Self {
        Self {
            message: MessageDocument::from(record.message()),
            signatures: SignaturesDocument {
                verifier: record.verifier_signature().map(SignatureDocument::from),
                receiver: record.receiver_signature().map(SignatureDocument::from),
            },
        }
    }
}
