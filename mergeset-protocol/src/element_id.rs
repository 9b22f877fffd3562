use std::{cmp::Ordering, convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::InvalidElementId, op_id::OpId};

/// The address of a position in a list or text object: either the sentinel
/// `Head` (the start of the sequence) or the op id of the insertion that
/// introduced the element -- this is what makes the address stable across
/// concurrent edits elsewhere in the sequence.
#[derive(Eq, PartialEq, Debug, Hash, Clone, Serialize, Deserialize)]
pub enum ElementId {
    Head,
    Id(OpId),
}

impl PartialOrd for ElementId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ElementId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ElementId::Head, ElementId::Head) => Ordering::Equal,
            (ElementId::Head, _) => Ordering::Less,
            (_, ElementId::Head) => Ordering::Greater,
            (ElementId::Id(a), ElementId::Id(b)) => a.cmp(b),
        }
    }
}

impl ElementId {
    pub fn as_opid(&self) -> Option<&OpId> {
        match self {
            ElementId::Head => None,
            ElementId::Id(id) => Some(id),
        }
    }
}

impl From<OpId> for ElementId {
    fn from(id: OpId) -> Self {
        ElementId::Id(id)
    }
}

impl From<&OpId> for ElementId {
    fn from(id: &OpId) -> Self {
        ElementId::Id(id.clone())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Head => write!(f, "_head"),
            ElementId::Id(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for ElementId {
    type Err = InvalidElementId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "_head" => Ok(ElementId::Head),
            id => OpId::from_str(id)
                .map(ElementId::Id)
                .map_err(|_| InvalidElementId(id.to_string())),
        }
    }
}

impl TryFrom<&str> for ElementId {
    type Error = InvalidElementId;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        ElementId::from_str(s)
    }
}
