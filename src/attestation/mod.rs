// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Attestation data model and validation.
//!
//! An attestation is a claim authored by a verifier about a recipient. The
//! verifier signs it first, the recipient counter-signs it, and the fully
//! signed record can then be registered and minted as an EcoID.
//!
//! - `types` - the record, its message, signatures and derived status
//! - `schema` - the portable JSON document format
//! - `validation` - parsing, field checks and signature recovery

pub mod schema;
pub mod types;
pub mod validation;

pub use schema::{AttestationDocument, MessageDocument, SignatureDocument, SignaturesDocument};
pub use types::*;
pub use validation::{
    canonical_message_bytes, check_signature, derive_status, ensure_fully_signed, parse_address,
    recover_signer, validate, validate_message, verify_signature,
};
