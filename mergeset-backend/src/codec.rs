//! Stand-in for the binary columnar codec, which is an external
//! collaborator this engine only talks to through an interface
//! (`encodeChange`, `decodeChanges`, `encodeDocument`, `splitContainers`).
//! The real codec packs changes into a column-oriented binary layout; that
//! bit-for-bit format is explicitly out of scope here, so this module
//! implements the same four operations against a MessagePack encoding
//! instead, giving the backend a working, testable wire format without
//! committing to the columnar layout.

use mergeset_protocol as amp;

use crate::error::{MergesetError, Result};

/// Encodes a canonical change into the wire format [`crate::Backend::
/// apply_changes`]/[`crate::Backend::load_changes`] expect. Public so a
/// caller holding a `Change` it didn't get from [`crate::Backend::
/// get_changes`] -- one it built itself, or received through some other
/// channel -- can still produce bytes the facade accepts.
pub fn encode_change(change: &amp::Change) -> Vec<u8> {
    rmp_serde::to_vec(change).expect("a canonical Change always serializes")
}

pub(crate) fn decode_change(bytes: &[u8]) -> Result<amp::Change> {
    rmp_serde::from_read_ref(bytes).map_err(|e| MergesetError::Decode(e.to_string()))
}

/// Decomposes a multi-change blob into single-change chunks.
pub(crate) fn split_containers(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let changes: Vec<amp::Change> =
        rmp_serde::from_read_ref(bytes).map_err(|e| MergesetError::Decode(e.to_string()))?;
    Ok(changes.iter().map(encode_change).collect())
}

pub(crate) fn encode_document(changes: &[amp::Change]) -> Vec<u8> {
    rmp_serde::to_vec(changes).expect("canonical Changes always serialize")
}

pub(crate) fn decode_document(bytes: &[u8]) -> Result<Vec<amp::Change>> {
    rmp_serde::from_read_ref(bytes).map_err(|e| MergesetError::Decode(e.to_string()))
}
