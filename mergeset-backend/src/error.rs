use std::fmt::Debug;

use mergeset_protocol as amp;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergesetError {
    #[error("missing object: {0}")]
    MissingObject(amp::ObjectId),
    #[error("missing index in op {0}")]
    MissingIndex(usize),
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),
    #[error("skip list error: {0}")]
    SkipList(String),
    #[error("map key used where a list position was expected")]
    MapKeyInSeq,
    #[error("`_head` used where an op id was expected")]
    HeadToOpId,
    #[error("backend is frozen and can no longer be used")]
    StaleBackend,
    #[error("malformed change request: {0}")]
    MalformedRequest(String),
    #[error("change request for actor {actor} seq {seq} has already been applied")]
    AlreadyApplied { actor: amp::ActorId, seq: u64 },
    #[error("change request references unknown base version {0}")]
    UnknownBaseVersion(u64),
    #[error("canonical change did not match the change produced by the request: {0}")]
    Assertion(String),
    #[error("failed to decode a binary change: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, MergesetError>;
