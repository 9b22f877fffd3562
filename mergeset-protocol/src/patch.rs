use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{
    actor_id::ActorId, change_hash::ChangeHash, obj_type::ObjType, object_id::ObjectId,
    op_id::OpId, value::ScalarValue,
};

/// The structured diff consumed by a front-end to update its materialized
/// view of the document. `actor`/`seq` are present only on incremental
/// patches produced by a local change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub diffs: MapDiff,
    pub clock: HashMap<ActorId, u64>,
    pub deps: Vec<ChangeHash>,
    pub max_op: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

/// Multiple concurrent winners at the same `(obj, key)` are exposed keyed by
/// the op id that wrote them, so a front-end can render every conflicting
/// value rather than just the one that currently wins.
pub type OpIdToDiff = HashMap<OpId, Diff>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDiff {
    pub object_id: ObjectId,
    pub obj_type: ObjType,
    pub props: HashMap<SmolStr, OpIdToDiff>,
}

impl MapDiff {
    pub fn empty(object_id: ObjectId) -> Self {
        MapDiff {
            object_id,
            obj_type: ObjType::Map,
            props: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeqDiff {
    pub object_id: ObjectId,
    pub obj_type: ObjType,
    pub edits: Vec<DiffEdit>,
}

/// Every concurrent winner at a list/text element slot, keyed by the op id
/// that wrote it -- the same `OpIdToDiff` shape `MapDiff::props` uses, so a
/// front-end renders list-element conflicts the same way it renders map
/// conflicts instead of only ever seeing whichever op currently wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum DiffEdit {
    Insert {
        index: u64,
        elem_id: String,
        values: OpIdToDiff,
    },
    Update {
        index: u64,
        values: OpIdToDiff,
    },
    Remove {
        index: u64,
        count: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Diff {
    Map(MapDiff),
    Seq(SeqDiff),
    Value(ScalarValue),
}
