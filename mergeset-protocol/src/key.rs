use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{element_id::ElementId, op_id::OpId};

/// A field within an object. For a map this is a property name; for a
/// list or text object this is an [`ElementId`] -- either the `_head`
/// sentinel or the op id of the insertion that owns the slot.
#[derive(Eq, PartialEq, Debug, Hash, Clone, Serialize, Deserialize)]
pub enum Key {
    Map(SmolStr),
    Seq(ElementId),
}

impl Key {
    pub fn head() -> Self {
        Key::Seq(ElementId::Head)
    }

    pub fn as_element_id(&self) -> Option<ElementId> {
        match self {
            Key::Map(_) => None,
            Key::Seq(eid) => Some(eid.clone()),
        }
    }

    pub fn to_opid(&self) -> Option<OpId> {
        match self {
            Key::Map(_) => None,
            Key::Seq(eid) => eid.as_opid().cloned(),
        }
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Key::Seq(_))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Key::Map(a), Key::Map(b)) => a.partial_cmp(b),
            (Key::Seq(a), Key::Seq(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Map(s) => f.write_str(s),
            Key::Seq(eid) => write!(f, "{}", eid),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Map(s.into())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Map(s.into())
    }
}

impl From<OpId> for Key {
    fn from(id: OpId) -> Self {
        Key::Seq(ElementId::Id(id))
    }
}

impl From<&OpId> for Key {
    fn from(id: &OpId) -> Self {
        Key::Seq(ElementId::Id(id.clone()))
    }
}

impl From<ElementId> for Key {
    fn from(id: ElementId) -> Self {
        Key::Seq(id)
    }
}
