use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InvalidChangeHash;

/// The content hash identifying a [`Change`](crate::Change). Hashes form the
/// vertices of the causal graph: a change's `deps` are the hashes of the
/// changes it was authored after.
#[derive(Eq, PartialEq, Debug, Hash, Clone, PartialOrd, Ord, Copy, Serialize, Deserialize)]
pub struct ChangeHash(pub [u8; 32]);

impl ChangeHash {
    pub const fn zero() -> Self {
        ChangeHash([0; 32])
    }
}

impl Default for ChangeHash {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for ChangeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; 32]> for ChangeHash {
    fn from(bytes: [u8; 32]) -> Self {
        ChangeHash(bytes)
    }
}

impl TryFrom<&[u8]> for ChangeHash {
    type Error = InvalidChangeHash;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 32 {
            return Err(InvalidChangeHash(hex::encode(bytes)));
        }
        let mut array = [0; 32];
        array.copy_from_slice(bytes);
        Ok(ChangeHash(array))
    }
}

impl FromStr for ChangeHash {
    type Err = InvalidChangeHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| InvalidChangeHash(s.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}
