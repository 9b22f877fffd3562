//! The operation-set reconciliation engine for a collaborative-editing
//! CRDT document: resolves change requests against a causal history of
//! applied ops, deduplicates and folds concurrent writes, and produces the
//! diffs a front-end needs to stay in sync.
mod backend;
mod change_processor;
mod codec;
mod error;
mod hash;
mod object_store;
mod op_handle;
mod op_set;
mod predecessor;
mod skip_list;
mod version_registry;

mod diff;

pub use backend::Backend;
pub use codec::encode_change;
pub use error::{MergesetError, Result};

pub use mergeset_protocol as protocol;
