use serde::{Deserialize, Serialize};

use crate::{actor_id::ActorId, value::ScalarValue};

/// `ops[i].key` on the wire: a map key is a string, a list/text position is
/// an integer index (resolved against the working skip list during
/// canonicalization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestKey {
    Str(String),
    Num(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReqOpType {
    MakeMap,
    MakeList,
    MakeText,
    MakeTable,
    Del,
    Link,
    Inc,
    Set,
}

impl ReqOpType {
    pub fn is_make(self) -> bool {
        matches!(
            self,
            ReqOpType::MakeMap | ReqOpType::MakeList | ReqOpType::MakeText | ReqOpType::MakeTable
        )
    }
}

/// A single op as it arrives from the front-end: temporary object ids,
/// integer list positions, and an optional `child` naming a temp id for a
/// newly created container (or the target of a `link`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOp {
    pub action: ReqOpType,
    pub obj: String,
    pub key: RequestKey,
    #[serde(default)]
    pub child: Option<String>,
    #[serde(default)]
    pub value: Option<ScalarValue>,
    #[serde(default)]
    pub insert: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestType {
    Change,
}

/// The front-end → backend change request: a causally-linked batch of ops
/// authored against a (possibly lagging) `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub actor: ActorId,
    pub seq: u64,
    pub version: u64,
    pub time: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub request_type: RequestType,
    pub ops: Vec<RequestOp>,
}
