// Sample storage encoding
// Little-endian f64 blobs with SHA-256 checksums
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Sample blob length {0} is not a multiple of 8 bytes")]
    MalformedBlob(usize),
    #[error("Checksum mismatch for {trace_id}: expected {expected}, found {found}")]
    ChecksumMismatch {
        trace_id: String,
        expected: String,
        found: String,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

const SAMPLE_BYTES: usize = std::mem::size_of::<f64>();

/// Pack samples as consecutive little-endian f64 values
pub fn encode_samples(samples: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * SAMPLE_BYTES);
    for x in samples {
        bytes.extend_from_slice(&x.to_le_bytes());
    }
    bytes
}

pub fn decode_samples(bytes: &[u8]) -> StorageResult<Vec<f64>> {
    if bytes.len() % SAMPLE_BYTES != 0 {
        return Err(StorageError::MalformedBlob(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(|chunk| {
            let mut raw = [0u8; SAMPLE_BYTES];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Decode a blob after checking it against its stored checksum
pub fn verify_and_decode(trace_id: &str, bytes: &[u8], expected: &str) -> StorageResult<Vec<f64>> {
    let found = calculate_sha256(bytes);
    if found != expected {
        return Err(StorageError::ChecksumMismatch {
            trace_id: trace_id.to_string(),
            expected: expected.to_string(),
            found,
        });
    }
    decode_samples(bytes)
}
