//! Patch construction.
//!
//! Rather than track an incremental cursor through every mutation the way a
//! columnar implementation would, we rebuild the whole document diff from
//! `OpSet::by_object` on every call. That is strictly more work per patch,
//! but the op set is already fully materialized in memory and this keeps
//! the engine's only moving part (apply) simple; a future incremental
//! rewrite can reuse the same per-object traversal as its base case.
use itertools::Itertools;
use mergeset_protocol as amp;

use crate::op_set::OpSet;

impl OpSet {
    pub fn get_patch(&self) -> amp::Patch {
        amp::Patch {
            diffs: self.construct_map(&amp::ObjectId::Root),
            clock: self.clock(),
            deps: self.heads(),
            max_op: self.max_op,
            actor: None,
            seq: None,
        }
    }

    fn construct_diff(&self, obj: &amp::ObjectId) -> amp::Diff {
        let obj_type = self
            .by_object
            .get(obj)
            .map(|o| o.obj_type)
            .unwrap_or(amp::ObjType::Map);
        if obj_type.is_sequence() {
            amp::Diff::Seq(self.construct_seq(obj))
        } else {
            amp::Diff::Map(self.construct_map(obj))
        }
    }

    fn construct_map(&self, obj: &amp::ObjectId) -> amp::MapDiff {
        let Some(object) = self.by_object.get(obj) else {
            return amp::MapDiff::empty(obj.clone());
        };
        let mut props = std::collections::HashMap::new();
        let map_fields = object
            .props
            .iter()
            .filter_map(|(key, field)| match key {
                amp::Key::Map(name) => Some((name, field)),
                _ => None,
            })
            .sorted_by_key(|(name, _)| name.clone());
        for (name, field) in map_fields {
            if field.is_empty() {
                continue;
            }
            let mut by_op: amp::OpIdToDiff = std::collections::HashMap::new();
            for op in field.iter() {
                let diff = match op.child() {
                    Some(child) => self.construct_diff(&child),
                    None => amp::Diff::Value(op.value()),
                };
                by_op.insert(op.id.clone(), diff);
            }
            props.insert(name.clone(), by_op);
        }
        amp::MapDiff {
            object_id: obj.clone(),
            obj_type: object.obj_type,
            props,
        }
    }

    fn construct_seq(&self, obj: &amp::ObjectId) -> amp::SeqDiff {
        let Some(object) = self.by_object.get(obj) else {
            return amp::SeqDiff {
                object_id: obj.clone(),
                obj_type: amp::ObjType::List,
                edits: Vec::new(),
            };
        };
        let mut edits = Vec::new();
        for (index, (elem_id, _)) in object.elem_ids().iter().enumerate() {
            let key = amp::Key::from(elem_id.clone());
            let Some(field) = object.props.get(&key) else {
                continue;
            };
            if field.is_empty() {
                continue;
            }
            let mut values: amp::OpIdToDiff = std::collections::HashMap::new();
            for op in field.iter() {
                let diff = match op.child() {
                    Some(child) => self.construct_diff(&child),
                    None => amp::Diff::Value(op.value()),
                };
                values.insert(op.id.clone(), diff);
            }
            edits.push(amp::DiffEdit::Insert {
                index: index as u64,
                elem_id: elem_id.to_string(),
                values,
            });
        }
        amp::SeqDiff {
            object_id: obj.clone(),
            obj_type: object.obj_type,
            edits,
        }
    }
}
