use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
};

use mergeset_protocol as amp;

/// An `Op` paired with the id it was assigned when its change was applied
/// (`start_op + index @ actor`). Carries a `delta` accumulator so that
/// concurrent `inc` ops can be folded onto the `Set` they target without
/// ever becoming winners themselves.
#[derive(Clone)]
pub(crate) struct OpHandle {
    pub id: amp::OpId,
    op: amp::Op,
    delta: i64,
}

impl OpHandle {
    pub fn new(id: amp::OpId, op: amp::Op) -> Self {
        OpHandle { id, op, delta: 0 }
    }

    pub fn operation_key(&self) -> amp::Key {
        if self.insert {
            amp::Key::from(&self.id)
        } else {
            self.key.clone()
        }
    }

    pub fn child(&self) -> Option<amp::ObjectId> {
        match &self.action {
            amp::OpType::Make(_) => Some(amp::ObjectId::from(&self.id)),
            amp::OpType::Link(obj) => Some(obj.clone()),
            _ => None,
        }
    }

    /// If `inc` targets this handle's id (via `inc.pred`), fold its amount
    /// into our running delta. No-op for anything that isn't a `Set` of a
    /// counter.
    pub fn maybe_increment(&mut self, inc: &OpHandle) {
        if let amp::OpType::Inc(amount) = inc.action {
            if inc.pred.contains(&self.id) {
                if let amp::OpType::Set(ref v) = self.action {
                    if v.is_counter() {
                        self.delta += amount;
                    }
                }
            }
        }
    }

    pub fn counter_value(&self) -> Option<amp::ScalarValue> {
        match &self.action {
            amp::OpType::Set(amp::ScalarValue::Counter(base)) => {
                Some(amp::ScalarValue::Counter(base + self.delta))
            }
            _ => None,
        }
    }

    pub fn value(&self) -> amp::ScalarValue {
        self.counter_value().unwrap_or_else(|| match &self.action {
            amp::OpType::Set(v) => v.clone(),
            _ => amp::ScalarValue::Null,
        })
    }
}

impl fmt::Debug for OpHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpHandle")
            .field("id", &self.id.to_string())
            .field("action", &self.action)
            .field("obj", &self.obj)
            .field("key", &self.key)
            .finish()
    }
}

impl Deref for OpHandle {
    type Target = amp::Op;

    fn deref(&self) -> &Self::Target {
        &self.op
    }
}

impl Ord for OpHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl PartialOrd for OpHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OpHandle {}

impl Hash for OpHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
