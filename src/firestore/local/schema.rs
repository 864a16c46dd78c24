//! Key layout of the target records in the key/value store.
//!
//! ```text
//! target_global                               -> TargetGlobal
//! targets/<id>                                -> Target
//! target_index/<canonical id> 0x00 <id>       -> (empty)
//! ```
//!
//! Target ids are stored as big-endian `u32` with the sign bit flipped so that byte
//! order matches numeric order.

use crate::firestore::error::{data_loss, FirestoreResult};

pub(crate) const TARGET_GLOBAL_KEY: &[u8] = b"target_global";
pub(crate) const TARGETS_PREFIX: &[u8] = b"targets/";
const TARGET_INDEX_PREFIX: &[u8] = b"target_index/";
const TARGET_ID_LEN: usize = 4;

fn encode_target_id(target_id: i32) -> [u8; TARGET_ID_LEN] {
    ((target_id as u32) ^ 0x8000_0000).to_be_bytes()
}

/// Reads the target id stored in the last bytes of `key`.
pub(crate) fn decode_target_id(key: &[u8]) -> FirestoreResult<i32> {
    if key.len() < TARGET_ID_LEN {
        return Err(data_loss(format!("target key too short: {key:?}")));
    }
    let mut raw = [0u8; TARGET_ID_LEN];
    raw.copy_from_slice(&key[key.len() - TARGET_ID_LEN..]);
    Ok((u32::from_be_bytes(raw) ^ 0x8000_0000) as i32)
}

pub(crate) fn target_key(target_id: i32) -> Vec<u8> {
    let mut key = Vec::with_capacity(TARGETS_PREFIX.len() + TARGET_ID_LEN);
    key.extend_from_slice(TARGETS_PREFIX);
    key.extend_from_slice(&encode_target_id(target_id));
    key
}

pub(crate) fn target_index_prefix(canonical_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(TARGET_INDEX_PREFIX.len() + canonical_id.len() + 1);
    key.extend_from_slice(TARGET_INDEX_PREFIX);
    key.extend_from_slice(canonical_id.as_bytes());
    key.push(0);
    key
}

pub(crate) fn target_index_key(canonical_id: &str, target_id: i32) -> Vec<u8> {
    let mut key = target_index_prefix(canonical_id);
    key.extend_from_slice(&encode_target_id(target_id));
    key
}
