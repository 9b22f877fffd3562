use serde::{Deserialize, Serialize};

use crate::{key::Key, object_id::ObjectId, obj_type::ObjType, op_id::OpId, value::ScalarValue};

/// The canonicalized action of an [`Op`]. `child` from the wire request has
/// already been folded in here: a `Make` op's own id *is* the new object's
/// id, and a `Link` op's target is resolved to an [`ObjectId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpType {
    Make(ObjType),
    Del,
    Link(ObjectId),
    Inc(i64),
    Set(ScalarValue),
}

/// An atomic mutation against the document. `key` for list/text targets is
/// always an element id (or `_head`) -- the integer index the front-end sent
/// has already been resolved against a skip list before an `Op` is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    pub action: OpType,
    pub obj: ObjectId,
    pub key: Key,
    pub pred: Vec<OpId>,
    pub insert: bool,
}

impl Op {
    pub fn obj_type(&self) -> Option<ObjType> {
        match self.action {
            OpType::Make(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_inc(&self) -> bool {
        matches!(self.action, OpType::Inc(_))
    }

    pub fn is_del(&self) -> bool {
        matches!(self.action, OpType::Del)
    }

    /// The key this op actually occupies in `byObject[obj]`: for an insert
    /// this is the op's own id (it introduces a new element), otherwise it's
    /// the resolved key carried on the op itself.
    pub fn operation_key(&self, own_id: &OpId) -> Key {
        if self.insert {
            Key::from(own_id)
        } else {
            self.key.clone()
        }
    }
}
