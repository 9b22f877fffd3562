use std::{cmp::Ordering, convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::InvalidObjectId, op_id::OpId};

/// The identifier of a container (map, list, text or table). `Root` is the
/// single well-known container every document starts with; every other
/// object is identified by the op that created it.
#[derive(Eq, PartialEq, Debug, Hash, Clone, Serialize, Deserialize)]
pub enum ObjectId {
    Root,
    Id(OpId),
}

impl PartialOrd for ObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ObjectId::Root, ObjectId::Root) => Ordering::Equal,
            (ObjectId::Root, _) => Ordering::Less,
            (_, ObjectId::Root) => Ordering::Greater,
            (ObjectId::Id(a), ObjectId::Id(b)) => a.cmp(b),
        }
    }
}

impl From<OpId> for ObjectId {
    fn from(id: OpId) -> Self {
        ObjectId::Id(id)
    }
}

impl From<&OpId> for ObjectId {
    fn from(id: &OpId) -> Self {
        ObjectId::Id(id.clone())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Root => write!(f, "_root"),
            ObjectId::Id(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "_root" {
            Ok(ObjectId::Root)
        } else {
            OpId::from_str(s)
                .map(ObjectId::Id)
                .map_err(|_| InvalidObjectId(s.to_string()))
        }
    }
}

impl TryFrom<&str> for ObjectId {
    type Error = InvalidObjectId;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        ObjectId::from_str(s)
    }
}
