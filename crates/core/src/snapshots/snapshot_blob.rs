//! Snapshot blob compression.
//!
//! The persisted blob format is gzip-compressed UTF-8 JSON: an array of
//! full loan objects. Decompression must reproduce exactly the structure
//! passed to compression.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::snapshot_errors::SnapshotError;
use crate::errors::Result;
use crate::loans::Loan;

/// Serializes and gzip-compresses a loan list into an opaque blob.
pub fn compress_loans(loans: &[Loan]) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(loans)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| SnapshotError::Blob(format!("compression failed: {}", e)))?;
    let blob = encoder
        .finish()
        .map_err(|e| SnapshotError::Blob(format!("compression failed: {}", e)))?;
    Ok(blob)
}

/// Decompresses a snapshot blob back into the loan list it captured.
pub fn decompress_loans(blob: &[u8]) -> Result<Vec<Loan>> {
    let mut decoder = GzDecoder::new(blob);
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|e| SnapshotError::Blob(format!("decompression failed: {}", e)))?;
    let loans = serde_json::from_slice(&json)?;
    Ok(loans)
}
