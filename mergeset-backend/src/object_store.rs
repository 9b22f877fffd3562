use std::collections::HashMap;

use mergeset_protocol as amp;

use crate::{op_handle::OpHandle, skip_list::SkipList};

/// The set of ops currently occupying one `(obj, key)` slot, ordered with
/// the winner first (greatest op id per the Lamport order, see
/// [`amp::OpId`]'s `Ord` impl). More than one surviving entry means
/// concurrent, conflicting writes.
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldOps(Vec<OpHandle>);

impl FieldOps {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpHandle> {
        self.0.iter()
    }

    pub fn winner(&self) -> Option<&OpHandle> {
        self.0.first()
    }

    /// Applies `new_op` to this slot. Returns the ops it overwrote (empty
    /// for `inc`, which never overwrites -- it just folds its amount onto
    /// whichever winner(s) it targets via `pred`).
    pub fn incorporate(&mut self, new_op: OpHandle) -> Vec<OpHandle> {
        if new_op.is_inc() {
            for existing in self.0.iter_mut() {
                existing.maybe_increment(&new_op);
            }
            return Vec::new();
        }

        let mut overwritten = Vec::new();
        let mut i = 0;
        while i != self.0.len() {
            if new_op.pred.contains(&self.0[i].id) {
                overwritten.push(self.0.remove(i));
            } else {
                i += 1;
            }
        }

        if !new_op.is_del() {
            let pos = self.0.partition_point(|existing| existing.id > new_op.id);
            self.0.insert(pos, new_op);
        }

        overwritten
    }
}

/// Per-object record: the op that created it (giving its type), the
/// skip list of live element ids (lists/text only), and the current
/// winning ops for each field.
#[derive(Debug, Clone)]
pub(crate) struct ObjState {
    pub obj_type: amp::ObjType,
    pub elem_ids: Option<SkipList<amp::OpId, ()>>,
    pub props: HashMap<amp::Key, FieldOps>,
}

impl ObjState {
    pub fn new(obj_type: amp::ObjType) -> Self {
        ObjState {
            obj_type,
            elem_ids: obj_type.is_sequence().then(SkipList::new),
            props: HashMap::new(),
        }
    }

    pub fn is_seq(&self) -> bool {
        self.obj_type.is_sequence()
    }

    pub fn elem_ids(&self) -> &SkipList<amp::OpId, ()> {
        self.elem_ids
            .as_ref()
            .expect("elem_ids is only None for map-typed objects")
    }

    pub fn elem_ids_mut(&mut self) -> &mut SkipList<amp::OpId, ()> {
        self.elem_ids
            .as_mut()
            .expect("elem_ids is only None for map-typed objects")
    }

    pub fn index_of(&self, id: amp::OpId) -> Option<usize> {
        self.elem_ids.as_ref().and_then(|l| l.index_of(&id))
    }
}
