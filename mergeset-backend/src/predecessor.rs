//! Predecessor bookkeeping for a single change under construction.
//!
//! An op's `pred` must name whatever currently occupies its `(obj, key)`
//! slot. Usually that's the winner(s) already in the op set, but a change
//! often writes the same slot more than once (e.g. set a key, then set it
//! again), and the second write's predecessor is the first write, not
//! whatever the op set said before the change started.
use std::collections::HashMap;

use mergeset_protocol as amp;

use crate::op_set::OpSet;

#[derive(Default)]
pub(crate) struct PredecessorFiller {
    mine: HashMap<(amp::ObjectId, amp::Key), Vec<amp::OpId>>,
}

impl PredecessorFiller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Predecessors for the next op at `(obj, key)`: this change's own prior
    /// write to the slot if there is one, otherwise the op set's current
    /// winner(s).
    pub fn pred_for(&self, opset: &OpSet, obj: &amp::ObjectId, key: &amp::Key) -> Vec<amp::OpId> {
        match self.mine.get(&(obj.clone(), key.clone())) {
            Some(mine) => mine.clone(),
            None => opset
                .get_field_ops(obj, key)
                .into_iter()
                .map(|h| h.id.clone())
                .collect(),
        }
    }

    /// Records that `id` now occupies `(obj, key)` for the remainder of
    /// this change, superseding whatever this change previously wrote
    /// there.
    pub fn record(&mut self, obj: amp::ObjectId, key: amp::Key, id: amp::OpId) {
        self.mine.insert((obj, key), vec![id]);
    }
}
