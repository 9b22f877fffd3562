use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A stable identifier for an independent source of changes.
///
/// Actors are opaque to the reconciliation engine: two actors are related
/// only by the total order imposed on their string representation, which is
/// used to break ties between operations with the same counter.
#[derive(Deserialize, Serialize, Eq, PartialEq, Hash, Debug, Clone, PartialOrd, Ord)]
pub struct ActorId(String);

impl ActorId {
    pub fn to_bytes(&self) -> Vec<u8> {
        hex::decode(&self.0).unwrap_or_else(|_| self.0.as_bytes().to_vec())
    }

    pub fn from_bytes(bytes: &[u8]) -> ActorId {
        ActorId(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        ActorId(s.into())
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        ActorId(s)
    }
}

impl FromStr for ActorId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ActorId(s.into()))
    }
}
