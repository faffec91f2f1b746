//! Descriptor codec: payload encoding and job ID derivation

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::JobId;
use crate::Result;

/// Encode a descriptor into a node payload.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode a node payload into a descriptor.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(data)?)
}

/// Derive the ID of a job from its semantic fields.
///
/// Every field is length-prefixed before hashing, so no two distinct
/// field tuples feed the same byte stream into the digest.
pub fn derive_job_id(name: &str, version: &str, image: &str, command: &[String]) -> JobId {
    let mut hasher = Sha256::new();

    hash_str(&mut hasher, name);
    hash_str(&mut hasher, version);
    hash_str(&mut hasher, image);
    hasher.update((command.len() as u64).to_be_bytes());
    for arg in command {
        hash_str(&mut hasher, arg);
    }

    JobId::from(format!(
        "{}:{}:{}",
        name,
        version,
        hex::encode(hasher.finalize())
    ))
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_be_bytes());
    hasher.update(s.as_bytes());
}
