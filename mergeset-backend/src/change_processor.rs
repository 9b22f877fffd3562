//! Canonicalizes a front-end [`amp::ChangeRequest`] into the `Vec<amp::Op>`
//! body of a [`amp::Change`]: temp object ids become real [`amp::ObjectId`]s,
//! integer list positions become [`amp::Key`]s resolved against a working
//! copy of the target list, and redundant same-slot writes within the
//! request collapse into the op that actually ends up winning.
//!
//! Grounded on the request-resolution half of the reference backend's
//! `add_change`/`insert_operations` path: the op set doesn't see a request,
//! only canonical ops, so all of the temp-id and position bookkeeping has to
//! happen here, once, before the ops are ever applied.
use std::collections::HashMap;

use mergeset_protocol as amp;

use crate::{
    error::{MergesetError, Result},
    op_set::OpSet,
    predecessor::PredecessorFiller,
    skip_list::SkipList,
};

/// Resolves `request` against the current state of `opset` and returns the
/// canonical ops a change starting at `start_op` would contain. The caller
/// is responsible for wrapping these in a `Change` with the right `deps`.
///
/// `temp_ids` is the backend's own lineage-scoped translation table, not
/// scratch local to this call: a front-end may reference an object it
/// created in an earlier, already-applied request purely by the temporary
/// id it originally picked, before it has any way of knowing the real
/// canonical id the object was given. Entries are only ever added, never
/// evicted, for the life of a backend.
pub(crate) fn build_ops(
    opset: &OpSet,
    request: &amp::ChangeRequest,
    start_op: u64,
    temp_ids: &mut HashMap<String, amp::ObjectId>,
) -> Result<Vec<amp::Op>> {
    let mut ops: Vec<amp::Op> = Vec::new();
    let mut local_types: HashMap<amp::ObjectId, amp::ObjType> = HashMap::new();
    let mut local_lists: HashMap<amp::ObjectId, SkipList<amp::OpId, ()>> = HashMap::new();
    let mut slot_index: HashMap<(amp::ObjectId, amp::Key), usize> = HashMap::new();
    let mut pending_inc: HashMap<(amp::ObjectId, amp::Key), usize> = HashMap::new();
    let mut preds = PredecessorFiller::new();

    let own_id = |index: usize| amp::OpId::new(start_op + index as u64, &request.actor);

    for request_op in &request.ops {
        let obj = resolve_obj(&request_op.obj, temp_ids)?;
        let obj_type = local_types
            .get(&obj)
            .copied()
            .or_else(|| opset.by_object.get(&obj).map(|o| o.obj_type))
            .ok_or_else(|| MergesetError::MissingObject(obj.clone()))?;

        let key = if obj_type.is_sequence() {
            let list = local_lists.entry(obj.clone()).or_insert_with(|| {
                opset
                    .by_object
                    .get(&obj)
                    .map(|o| o.elem_ids().clone())
                    .unwrap_or_default()
            });
            resolve_seq_key(request_op, list)?
        } else {
            resolve_map_key(request_op)?
        };
        let slot = (obj.clone(), key.clone());

        if request_op.action == amp::ReqOpType::Inc {
            let amount = request_op.value.as_ref().and_then(|v| v.to_i64()).ok_or_else(|| {
                MergesetError::MalformedRequest("inc op carries no integer value".into())
            })?;
            if let Some(&i) = pending_inc.get(&slot) {
                if let amp::OpType::Inc(existing) = &mut ops[i].action {
                    *existing += amount;
                    continue;
                }
            }
            let pred = preds.pred_for(opset, &obj, &key);
            let index = ops.len();
            ops.push(amp::Op {
                action: amp::OpType::Inc(amount),
                obj,
                key,
                pred,
                insert: false,
            });
            pending_inc.insert(slot, index);
            continue;
        }

        if request_op.insert {
            let index = ops.len();
            let id = own_id(index);
            let action = canonical_action(request_op, &id, temp_ids)?;
            if let Some(list) = local_lists.get_mut(&obj) {
                let after = key.as_element_id().and_then(|e| e.as_opid().cloned());
                list.insert_after(after.as_ref(), id.clone(), ())
                    .map_err(|e| MergesetError::SkipList(e.to_string()))?;
            }
            register_new_object(request_op, &id, &mut local_types, &mut local_lists);
            ops.push(amp::Op {
                action,
                obj: obj.clone(),
                key,
                pred: Vec::new(),
                insert: true,
            });
            preds.record(obj, amp::Key::from(&id), id);
            continue;
        }

        let existing = slot_index.get(&slot).copied();
        let index = existing.unwrap_or_else(|| ops.len());
        let id = own_id(index);
        // `pred` is the true prior occupant of this slot and only makes
        // sense the first time the slot is written in this change: a
        // repeated write to the same slot reuses `id` (same index), so
        // recomputing `pred_for` on the second occurrence would return
        // `[id]` (the op now predecessing itself) and throw away the real
        // predecessor set the first occurrence already captured.
        let action = canonical_action(request_op, &id, temp_ids)?;
        register_new_object(request_op, &id, &mut local_types, &mut local_lists);
        let op = match existing {
            Some(i) => amp::Op {
                action,
                obj: obj.clone(),
                key: key.clone(),
                pred: ops[i].pred.clone(),
                insert: false,
            },
            None => {
                let pred = preds.pred_for(opset, &obj, &key);
                amp::Op {
                    action,
                    obj: obj.clone(),
                    key: key.clone(),
                    pred,
                    insert: false,
                }
            }
        };
        match existing {
            Some(i) => ops[i] = op,
            None => {
                slot_index.insert(slot.clone(), ops.len());
                ops.push(op);
            }
        }
        if request_op.action == amp::ReqOpType::Del {
            if let (true, Some(elem)) = (obj_type.is_sequence(), key.to_opid()) {
                if let Some(list) = local_lists.get_mut(&obj) {
                    let _ = list.remove_key(&elem);
                }
            }
        }

        pending_inc.remove(&slot);
        if existing.is_none() {
            preds.record(obj, key, id);
        }
    }

    Ok(ops)
}

fn resolve_obj(s: &str, temp_ids: &HashMap<String, amp::ObjectId>) -> Result<amp::ObjectId> {
    if let Some(id) = temp_ids.get(s) {
        return Ok(id.clone());
    }
    s.parse::<amp::ObjectId>()
        .map_err(|_| MergesetError::MalformedRequest(format!("unknown object id {}", s)))
}

fn resolve_map_key(request_op: &amp::RequestOp) -> Result<amp::Key> {
    match &request_op.key {
        amp::RequestKey::Str(s) => Ok(amp::Key::from(s.clone())),
        amp::RequestKey::Num(_) => Err(MergesetError::MalformedRequest(
            "numeric key used against a map object".into(),
        )),
    }
}

fn resolve_seq_key(
    request_op: &amp::RequestOp,
    list: &SkipList<amp::OpId, ()>,
) -> Result<amp::Key> {
    let index = match &request_op.key {
        amp::RequestKey::Num(n) => *n as usize,
        amp::RequestKey::Str(_) => {
            return Err(MergesetError::MalformedRequest(
                "string key used against a sequence object".into(),
            ))
        }
    };
    if request_op.insert {
        if index == 0 {
            Ok(amp::Key::head())
        } else {
            let pred = list
                .key_of(index - 1)
                .ok_or(MergesetError::IndexOutOfBounds(index))?;
            Ok(amp::Key::from(pred))
        }
    } else {
        let elem = list
            .key_of(index)
            .ok_or(MergesetError::IndexOutOfBounds(index))?;
        Ok(amp::Key::from(elem))
    }
}

fn canonical_action(
    request_op: &amp::RequestOp,
    own_id: &amp::OpId,
    temp_ids: &mut HashMap<String, amp::ObjectId>,
) -> Result<amp::OpType> {
    use amp::ReqOpType::*;
    let action = match request_op.action {
        MakeMap => amp::OpType::Make(amp::ObjType::Map),
        MakeList => amp::OpType::Make(amp::ObjType::List),
        MakeText => amp::OpType::Make(amp::ObjType::Text),
        MakeTable => amp::OpType::Make(amp::ObjType::Table),
        Del => amp::OpType::Del,
        Link => {
            let target = request_op.child.as_deref().ok_or_else(|| {
                MergesetError::MalformedRequest("link op carries no child".into())
            })?;
            amp::OpType::Link(resolve_obj(target, temp_ids)?)
        }
        Inc => unreachable!("inc ops are folded before canonical_action is reached"),
        Set => {
            let value = request_op.value.clone().ok_or_else(|| {
                MergesetError::MalformedRequest("set op carries no value".into())
            })?;
            amp::OpType::Set(value)
        }
    };
    if request_op.action.is_make() {
        if let Some(child) = &request_op.child {
            temp_ids.insert(child.clone(), amp::ObjectId::from(own_id));
        }
    }
    Ok(action)
}

fn register_new_object(
    request_op: &amp::RequestOp,
    own_id: &amp::OpId,
    local_types: &mut HashMap<amp::ObjectId, amp::ObjType>,
    local_lists: &mut HashMap<amp::ObjectId, SkipList<amp::OpId, ()>>,
) {
    let obj_type = match request_op.action {
        amp::ReqOpType::MakeMap => amp::ObjType::Map,
        amp::ReqOpType::MakeList => amp::ObjType::List,
        amp::ReqOpType::MakeText => amp::ObjType::Text,
        amp::ReqOpType::MakeTable => amp::ObjType::Table,
        _ => return,
    };
    let new_obj = amp::ObjectId::from(own_id);
    if obj_type.is_sequence() {
        local_lists.insert(new_obj.clone(), SkipList::new());
    }
    local_types.insert(new_obj, obj_type);
}
