// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Attestation parsing and signature verification.
//!
//! [`validate`] only checks shape: schema, address format, claim bounds and
//! signature encoding. Whether a signature was actually produced by the
//! party it is stored for is answered by [`verify_signature`], which recovers
//! the signer from the EIP-191 signature over [`canonical_message_bytes`].
//!
//! Everything here is pure and deterministic.

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, Signature};
use chrono::NaiveDate;

use super::schema::{AttestationDocument, MessageDocument, SignatureDocument, DEADLINE_FORMAT};
use super::types::{
    AttestationMessage, AttestationRecord, AttestationSignature, Role, Status, CLAIM_MAX_CHARS,
    CLAIM_MIN_CHARS, SIGNATURE_LEN,
};
use crate::error::ValidationError;

/// Parse attestation bytes into a record.
pub fn validate(bytes: &[u8]) -> Result<AttestationRecord, ValidationError> {
    let document: AttestationDocument =
        serde_json::from_slice(bytes).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    AttestationRecord::try_from(document)
}

/// Check the field constraints of a message.
pub fn validate_message(message: &AttestationMessage) -> Result<(), ValidationError> {
    let actual = message.claim.chars().count();
    if !(CLAIM_MIN_CHARS..=CLAIM_MAX_CHARS).contains(&actual) {
        return Err(ValidationError::ClaimLength {
            actual,
            min: CLAIM_MIN_CHARS,
            max: CLAIM_MAX_CHARS,
        });
    }
    Ok(())
}

/// Parse a `0x`-prefixed, 40 hex character address.
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lowercase and
/// all-uppercase input is accepted as is.
pub fn parse_address(field: &'static str, raw: &str) -> Result<Address, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidAddress {
        field,
        reason: reason.to_string(),
    };

    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| invalid("missing 0x prefix"))?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("expected 40 hexadecimal characters"));
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(raw, None).map_err(|_| invalid("checksum mismatch"))
    } else {
        Address::from_str(raw).map_err(|e| invalid(&e.to_string()))
    }
}

fn parse_deadline(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw, DEADLINE_FORMAT)
        .map_err(|_| ValidationError::InvalidDeadline(raw.to_string()))
}

fn parse_signature(
    role: Role,
    document: SignatureDocument,
) -> Result<AttestationSignature, ValidationError> {
    let signer = parse_address("signer", &document.signer)?;

    let format_error = |reason: String| ValidationError::SignatureFormat { role, reason };
    let digits = document
        .signature
        .strip_prefix("0x")
        .ok_or_else(|| format_error("missing 0x prefix".into()))?;
    let raw = alloy::hex::decode(digits).map_err(|e| format_error(e.to_string()))?;
    if raw.len() != SIGNATURE_LEN {
        return Err(format_error(format!(
            "expected {SIGNATURE_LEN} bytes, got {}",
            raw.len()
        )));
    }

    Ok(AttestationSignature {
        signer,
        signature: Bytes::from(raw),
    })
}

impl TryFrom<MessageDocument> for AttestationMessage {
    type Error = ValidationError;

    fn try_from(document: MessageDocument) -> Result<Self, Self::Error> {
        let message = AttestationMessage {
            recipient: parse_address("recipient", &document.recipient)?,
            verifier: parse_address("verifier", &document.verifier)?,
            deadline: parse_deadline(&document.deadline)?,
            revocable: document.revocable,
            claim: document.claim,
        };
        validate_message(&message)?;
        Ok(message)
    }
}

impl TryFrom<AttestationDocument> for AttestationRecord {
    type Error = ValidationError;

    fn try_from(document: AttestationDocument) -> Result<Self, Self::Error> {
        let mut record = AttestationRecord::new(AttestationMessage::try_from(document.message)?);
        if let Some(signature) = document.signatures.verifier {
            record.set_signature(Role::Verifier, parse_signature(Role::Verifier, signature)?);
        }
        if let Some(signature) = document.signatures.receiver {
            record.set_signature(Role::Receiver, parse_signature(Role::Receiver, signature)?);
        }
        Ok(record)
    }
}

/// Bytes both parties sign.
///
/// Compact JSON with lexicographically ordered keys and checksummed
/// addresses, so every implementation produces the same bytes.
pub fn canonical_message_bytes(message: &AttestationMessage) -> Vec<u8> {
    let document = MessageDocument::from(message);
    serde_json::json!({
        "claim": document.claim,
        "deadline": document.deadline,
        "recipient": document.recipient,
        "revocable": document.revocable,
        "verifier": document.verifier,
    })
    .to_string()
    .into_bytes()
}

/// Recover the address that produced `signature` over `message`.
pub fn recover_signer(message: &AttestationMessage, signature: &[u8]) -> Option<Address> {
    let signature = Signature::from_raw(signature).ok()?;
    signature
        .recover_address_from_msg(canonical_message_bytes(message))
        .ok()
}

/// Whether the stored signature for `role` was produced by the role's address.
pub fn verify_signature(record: &AttestationRecord, role: Role) -> bool {
    check_signature(record, role).is_ok()
}

/// Like [`verify_signature`], but says why a signature is not valid.
pub fn check_signature(record: &AttestationRecord, role: Role) -> Result<(), ValidationError> {
    let stored = record
        .signature(role)
        .ok_or(ValidationError::MissingSignature { role })?;
    match recover_signer(record.message(), &stored.signature) {
        Some(address) if address == record.message().address_for(role) => Ok(()),
        _ => Err(ValidationError::SignatureMismatch { role }),
    }
}

/// Both signatures present and valid.
pub fn ensure_fully_signed(record: &AttestationRecord) -> Result<(), ValidationError> {
    check_signature(record, Role::Verifier)?;
    check_signature(record, Role::Receiver)
}

/// Signature-derived status of a record.
///
/// Never returns `Registered` or `Minted`; those depend on ledger results
/// held by the workflow context.
pub fn derive_status(record: &AttestationRecord) -> Status {
    if !verify_signature(record, Role::Verifier) {
        Status::Unsigned
    } else if !verify_signature(record, Role::Receiver) {
        Status::VerifierSigned
    } else {
        Status::BothSigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_transfer;
    use crate::test_support::{
        fully_signed_record, recipient_key, sample_message, sign_as, verifier_key,
        verifier_signed_record,
    };

    fn document_json(record: &AttestationRecord) -> serde_json::Value {
        serde_json::to_value(AttestationDocument::from(record)).unwrap()
    }

    #[test]
    fn validate_accepts_exported_document() {
        let record = verifier_signed_record();
        let bytes = serde_json::to_vec(&document_json(&record)).unwrap();
        assert_eq!(validate(&bytes).unwrap(), record);
    }

    #[test]
    fn validate_rejects_garbage() {
        let err = validate(b"not json").unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn validate_rejects_unknown_fields() {
        let mut json = document_json(&verifier_signed_record());
        json["message"]["extra"] = serde_json::json!("field");
        let err = validate(&serde_json::to_vec(&json).unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn validate_rejects_short_address() {
        let mut json = document_json(&verifier_signed_record());
        json["message"]["recipient"] = serde_json::json!("0x1234");
        let err = validate(&serde_json::to_vec(&json).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidAddress {
                field: "recipient",
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_claim() {
        for claim in ["abc", "x".repeat(36).as_str()] {
            let mut json = document_json(&verifier_signed_record());
            json["message"]["claim"] = serde_json::json!(claim);
            let err = validate(&serde_json::to_vec(&json).unwrap()).unwrap_err();
            assert!(matches!(err, ValidationError::ClaimLength { .. }));
        }
    }

    #[test]
    fn claim_bounds_are_inclusive_and_count_characters() {
        let mut message = sample_message();
        message.claim = "abcd".into();
        assert!(validate_message(&message).is_ok());
        message.claim = "é".repeat(35);
        assert!(validate_message(&message).is_ok());
        message.claim = "é".repeat(36);
        assert!(validate_message(&message).is_err());
    }

    #[test]
    fn validate_rejects_bad_deadline() {
        let mut json = document_json(&verifier_signed_record());
        json["message"]["deadline"] = serde_json::json!("01/01/2025");
        let err = validate(&serde_json::to_vec(&json).unwrap()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidDeadline("01/01/2025".into()));
    }

    #[test]
    fn validate_rejects_truncated_signature() {
        let mut json = document_json(&verifier_signed_record());
        json["signatures"]["verifier"]["signature"] = serde_json::json!("0xdeadbeef");
        let err = validate(&serde_json::to_vec(&json).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::SignatureFormat {
                role: Role::Verifier,
                ..
            }
        ));
    }

    #[test]
    fn parse_address_enforces_checksum_on_mixed_case() {
        // EIP-55 reference vector.
        let valid = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let address = parse_address("verifier", valid).unwrap();
        assert_eq!(address.to_checksum(None), valid);

        let lower = valid.to_ascii_lowercase();
        assert_eq!(parse_address("verifier", &lower).unwrap(), address);

        let broken = "0x5aaeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let err = parse_address("verifier", broken).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidAddress {
                field: "verifier",
                reason: "checksum mismatch".into(),
            }
        );
    }

    #[test]
    fn parse_address_requires_prefix() {
        let err = parse_address("recipient", &"a".repeat(40)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAddress { .. }));
    }

    #[test]
    fn verify_signature_matches_role_address() {
        let record = fully_signed_record();
        assert!(verify_signature(&record, Role::Verifier));
        assert!(verify_signature(&record, Role::Receiver));
    }

    #[test]
    fn verify_signature_rejects_wrong_signer() {
        let message = sample_message();
        // The recipient signing in the verifier slot must not count.
        let forged = sign_as(&recipient_key(), &message);
        let record = AttestationRecord::new(message).with_signature(Role::Verifier, forged);
        assert!(!verify_signature(&record, Role::Verifier));
        assert_eq!(
            check_signature(&record, Role::Verifier),
            Err(ValidationError::SignatureMismatch {
                role: Role::Verifier
            })
        );
    }

    #[test]
    fn verify_signature_ignores_stored_signer_label() {
        let message = sample_message();
        let mut signature = sign_as(&verifier_key(), &message);
        signature.signer = Address::repeat_byte(0x42);
        let record = AttestationRecord::new(message).with_signature(Role::Verifier, signature);
        assert!(verify_signature(&record, Role::Verifier));
    }

    #[test]
    fn tampered_message_invalidates_signatures() {
        let record = fully_signed_record();
        let mut json = document_json(&record);
        json["message"]["claim"] = serde_json::json!("something else");
        let tampered = validate(&serde_json::to_vec(&json).unwrap()).unwrap();
        assert!(!verify_signature(&tampered, Role::Verifier));
        assert!(!verify_signature(&tampered, Role::Receiver));
        assert_eq!(derive_status(&tampered), Status::Unsigned);
    }

    #[test]
    fn derive_status_tracks_signatures() {
        assert_eq!(
            derive_status(&AttestationRecord::new(sample_message())),
            Status::Unsigned
        );
        assert_eq!(
            derive_status(&verifier_signed_record()),
            Status::VerifierSigned
        );
        assert_eq!(derive_status(&fully_signed_record()), Status::BothSigned);
    }

    #[test]
    fn receiver_signature_alone_is_unsigned() {
        let message = sample_message();
        let receiver = sign_as(&recipient_key(), &message);
        let record = AttestationRecord::new(message).with_signature(Role::Receiver, receiver);
        assert_eq!(derive_status(&record), Status::Unsigned);
    }

    #[test]
    fn canonical_bytes_are_stable_and_sorted() {
        let message = sample_message();
        let bytes = canonical_message_bytes(&message);
        assert_eq!(bytes, canonical_message_bytes(&message.clone()));

        let text = String::from_utf8(bytes).unwrap();
        let claim = text.find("\"claim\"").unwrap();
        let deadline = text.find("\"deadline\"").unwrap();
        let recipient = text.find("\"recipient\"").unwrap();
        let verifier = text.find("\"verifier\"").unwrap();
        assert!(claim < deadline && deadline < recipient && recipient < verifier);
        assert!(text.contains("\"deadline\":\"2025-01-01\""));
    }

    #[test]
    fn export_then_validate_preserves_signature_validity() {
        let record = fully_signed_record();
        let file = file_transfer::export(&record).unwrap();
        let parsed = validate(&file.bytes).unwrap();
        assert_eq!(derive_status(&parsed), Status::BothSigned);
    }
}
