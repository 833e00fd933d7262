// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Attestation File Transfer
//!
//! Converts records to and from the portable JSON document that the two
//! parties exchange. The exported file is the only persistence an attestation
//! has: the verifier downloads it and hands it to the recipient, who uploads
//! it to counter-sign.
//!
//! Writing the bytes somewhere is left to the caller; [`ExportedFile::write_into`]
//! covers the plain filesystem case.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::attestation::{validate, AttestationDocument, AttestationRecord};
use crate::error::ValidationError;

/// Prefix of every exported file name, followed by the recipient address.
pub const FILE_NAME_PREFIX: &str = "attestation-";

/// Serialized attestation ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl ExportedFile {
    /// Write the file into `dir` under its suggested name.
    pub fn write_into(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to encode attestation: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Parse(#[from] ValidationError),
}

/// Suggested file name for `record`.
pub fn file_name_for(record: &AttestationRecord) -> String {
    format!(
        "{FILE_NAME_PREFIX}{}",
        record.message().recipient.to_checksum(None)
    )
}

/// Serialize `record` as a pretty-printed attestation document.
pub fn export(record: &AttestationRecord) -> Result<ExportedFile, TransferError> {
    let bytes = serde_json::to_vec_pretty(&AttestationDocument::from(record))?;
    Ok(ExportedFile {
        bytes,
        file_name: file_name_for(record),
    })
}

/// Parse an uploaded attestation document.
pub fn import(bytes: &[u8]) -> Result<AttestationRecord, TransferError> {
    Ok(validate(bytes)?)
}
