use serde::{Deserialize, Serialize};

use crate::{actor_id::ActorId, change_hash::ChangeHash, op::Op};

/// A causally-linked batch of canonical ops. `hash` is not carried over the
/// wire -- it's computed from the rest of the fields by whatever encodes
/// this change, and re-derived on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub actor: ActorId,
    pub seq: u64,
    pub start_op: u64,
    pub deps: Vec<ChangeHash>,
    pub time: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub ops: Vec<Op>,
}

impl Change {
    pub fn max_op(&self) -> u64 {
        self.start_op + (self.ops.len() as u64).saturating_sub(1)
    }
}
