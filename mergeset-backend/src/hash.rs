//! Content hashing for applied changes.
//!
//! The real wire format for a change is produced by an external binary
//! columnar codec (out of scope here -- see the module docs on
//! [`crate::codec`]). We still need *some* deterministic hash to identify a
//! change and link it into the causal graph, so we hash a MessagePack
//! encoding of the canonical [`amp::Change`] via `rmp-serde`, the same crate
//! the protocol types are already exercised against in their round-trip
//! tests.

use std::convert::TryFrom;

use mergeset_protocol as amp;
use sha2::{Digest, Sha256};

pub(crate) fn hash_change(change: &amp::Change) -> amp::ChangeHash {
    let bytes = rmp_serde::to_vec(change).expect("a canonical Change always serializes");
    let digest = Sha256::digest(&bytes);
    amp::ChangeHash::try_from(digest.as_slice()).expect("a sha256 digest is always 32 bytes")
}
