use std::{
    cmp::Ordering,
    convert::TryFrom,
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{actor_id::ActorId, error::InvalidOpId};

/// `"<counter>@<actor>"`. `counter` is a document-wide monotonic op counter
/// (not per-actor). OpIds are totally ordered: counter ascending, ties broken
/// by actor string *descending* -- this is the Lamport order used throughout
/// the engine to decide which of several concurrent writes wins.
#[derive(Eq, PartialEq, Debug, Hash, Clone, Serialize, Deserialize)]
pub struct OpId {
    pub counter: u64,
    pub actor: ActorId,
}

impl OpId {
    pub fn new(counter: u64, actor: &ActorId) -> Self {
        OpId {
            counter,
            actor: actor.clone(),
        }
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.counter.cmp(&other.counter) {
            Ordering::Equal => other.actor.cmp(&self.actor),
            ord => ord,
        }
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.counter, self.actor)
    }
}

impl FromStr for OpId {
    type Err = InvalidOpId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(counter_str), Some(actor_str), None) => counter_str
                .parse()
                .map(|counter| OpId::new(counter, &actor_str.into()))
                .map_err(|_| InvalidOpId(s.to_string())),
            _ => Err(InvalidOpId(s.to_string())),
        }
    }
}

impl TryFrom<&str> for OpId {
    type Error = InvalidOpId;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        OpId::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_counter_then_actor_descending() {
        let a = OpId::new(1, &"aaaa".into());
        let b = OpId::new(1, &"bbbb".into());
        // same counter: descending actor order, so the lexicographically
        // smaller actor wins the tie.
        assert!(a > b);
        let c = OpId::new(2, &"aaaa".into());
        assert!(b < c);
    }

    #[test]
    fn round_trips_through_display_and_from_str() {
        let id = OpId::new(42, &"abcd1234".into());
        let s = id.to_string();
        assert_eq!(s, "42@abcd1234");
        assert_eq!(s.parse::<OpId>().unwrap(), id);
    }
}
