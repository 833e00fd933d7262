// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use alloy::primitives::Bytes;
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use chrono::NaiveDate;

use crate::attestation::{
    canonical_message_bytes, AttestationMessage, AttestationRecord, AttestationSignature, Role,
};

pub fn verifier_key() -> PrivateKeySigner {
    PrivateKeySigner::from_slice(&[0x11; 32]).unwrap()
}

pub fn recipient_key() -> PrivateKeySigner {
    PrivateKeySigner::from_slice(&[0x22; 32]).unwrap()
}

pub fn stranger_key() -> PrivateKeySigner {
    PrivateKeySigner::from_slice(&[0x33; 32]).unwrap()
}

pub fn sample_message() -> AttestationMessage {
    AttestationMessage {
        recipient: recipient_key().address(),
        verifier: verifier_key().address(),
        deadline: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        revocable: true,
        claim: "hello world".into(),
    }
}

pub fn sign_as(key: &PrivateKeySigner, message: &AttestationMessage) -> AttestationSignature {
    let signature = key
        .sign_message_sync(&canonical_message_bytes(message))
        .unwrap();
    AttestationSignature {
        signer: key.address(),
        signature: Bytes::from(signature.as_bytes().to_vec()),
    }
}

pub fn verifier_signed_record() -> AttestationRecord {
    let message = sample_message();
    let signature = sign_as(&verifier_key(), &message);
    AttestationRecord::new(message).with_signature(Role::Verifier, signature)
}

pub fn fully_signed_record() -> AttestationRecord {
    let record = verifier_signed_record();
    let signature = sign_as(&recipient_key(), record.message());
    record.with_signature(Role::Receiver, signature)
}
