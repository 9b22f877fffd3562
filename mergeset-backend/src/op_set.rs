//! The causal history: every applied op indexed by object and key, the
//! per-actor sequence state, the dependency frontier, the max op counter,
//! and the queue of changes whose dependencies are not yet satisfied.
use std::collections::{HashMap, HashSet};

use fxhash::FxBuildHasher;
use itertools::Itertools;
use mergeset_protocol as amp;
use tracing::{instrument, trace};

use crate::{
    error::{MergesetError, Result},
    hash::hash_change,
    object_store::ObjState,
    op_handle::OpHandle,
};

#[derive(Debug, Clone)]
pub(crate) struct OpSet {
    pub by_object: HashMap<amp::ObjectId, ObjState, FxBuildHasher>,
    pub deps: HashSet<amp::ChangeHash>,
    pub max_op: u64,
    pub states: HashMap<amp::ActorId, Vec<amp::ChangeHash>>,
    pub history: Vec<(amp::ChangeHash, amp::Change)>,
    pub history_index: HashMap<amp::ChangeHash, usize>,
    pub queue: Vec<(amp::ChangeHash, amp::Change)>,
}

impl OpSet {
    pub fn init() -> Self {
        let mut by_object = HashMap::default();
        by_object.insert(amp::ObjectId::Root, ObjState::new(amp::ObjType::Map));
        OpSet {
            by_object,
            deps: HashSet::new(),
            max_op: 0,
            states: HashMap::new(),
            history: Vec::new(),
            history_index: HashMap::new(),
            queue: Vec::new(),
        }
    }

    pub fn heads(&self) -> Vec<amp::ChangeHash> {
        self.deps.iter().copied().sorted().collect()
    }

    pub fn has_change(&self, hash: &amp::ChangeHash) -> bool {
        self.history_index.contains_key(hash)
    }

    pub fn get_change(&self, hash: &amp::ChangeHash) -> Option<&amp::Change> {
        self.history_index
            .get(hash)
            .map(|&idx| &self.history[idx].1)
    }

    /// Applies `change` if its dependencies are satisfied, otherwise queues
    /// it and returns without error. Re-checks the queue afterwards so any
    /// change this one unblocks is applied transitively.
    #[instrument(skip(self, change))]
    pub fn add_change(&mut self, change: amp::Change) -> Result<()> {
        let hash = hash_change(&change);
        if self.has_change(&hash) {
            return Ok(());
        }
        if !change.deps.iter().all(|d| self.has_change(d)) {
            trace!(?hash, "change has unmet dependencies, queueing");
            self.queue.push((hash, change));
            return Ok(());
        }
        self.apply_change(hash, change)?;
        self.drain_queue()
    }

    fn drain_queue(&mut self) -> Result<()> {
        loop {
            let ready_index = self
                .queue
                .iter()
                .position(|(_, change)| change.deps.iter().all(|d| self.has_change(d)));
            let Some(index) = ready_index else {
                return Ok(());
            };
            let (hash, change) = self.queue.remove(index);
            self.apply_change(hash, change)?;
        }
    }

    fn apply_change(&mut self, hash: amp::ChangeHash, change: amp::Change) -> Result<()> {
        let actor = change.actor.clone();
        let start_op = change.start_op;
        let max_op = change.max_op();

        for (i, op) in change.ops.iter().enumerate() {
            let id = amp::OpId::new(start_op + i as u64, &actor);
            self.apply_op(id, op.clone())?;
        }

        self.max_op = self.max_op.max(max_op);
        for dep in &change.deps {
            self.deps.remove(dep);
        }
        self.deps.insert(hash);

        let index = self.history.len();
        self.states.entry(actor).or_default().push(hash);
        self.history_index.insert(hash, index);
        self.history.push((hash, change));
        Ok(())
    }

    fn apply_op(&mut self, id: amp::OpId, op: amp::Op) -> Result<()> {
        if let Some(obj_type) = op.obj_type() {
            self.by_object
                .insert(amp::ObjectId::from(&id), ObjState::new(obj_type));
        }

        let obj_id = op.obj.clone();
        let object = self
            .by_object
            .get_mut(&obj_id)
            .ok_or_else(|| MergesetError::MissingObject(obj_id.clone()))?;
        let handle = OpHandle::new(id, op);

        if object.is_seq() {
            if handle.insert {
                let pred = handle
                    .key
                    .as_element_id()
                    .ok_or(MergesetError::MapKeyInSeq)?
                    .as_opid()
                    .cloned();
                object
                    .elem_ids_mut()
                    .insert_after(pred.as_ref(), handle.id.clone(), ())
                    .map_err(|e| MergesetError::SkipList(e.to_string()))?;
            }
            let key = handle.operation_key();
            let is_del = handle.is_del();
            let field = object.props.entry(key.clone()).or_default();
            field.incorporate(handle);
            if is_del && field.is_empty() {
                let elem = key.to_opid().ok_or(MergesetError::HeadToOpId)?;
                // already removed if nothing ever inserted it (shouldn't happen for a
                // well-formed change); ignore if it's already gone.
                let _ = object.elem_ids_mut().remove_key(&elem);
            }
        } else {
            let key = handle.key.clone();
            object.props.entry(key).or_default().incorporate(handle);
        }
        Ok(())
    }

    /// Current winners at `(obj, key)`. For maps, more than one entry means
    /// concurrent conflicting assignments.
    pub fn get_field_ops(&self, obj: &amp::ObjectId, key: &amp::Key) -> Vec<&OpHandle> {
        self.by_object
            .get(obj)
            .and_then(|o| o.props.get(key))
            .map(|f| f.iter().collect())
            .unwrap_or_default()
    }

    /// Every change in `history` not reachable (through `deps`) from
    /// `have_deps`, in the topological order `history` is already
    /// maintained in.
    pub fn get_missing_changes(&self, have_deps: &[amp::ChangeHash]) -> Vec<&amp::Change> {
        let mut reachable: HashSet<amp::ChangeHash> = HashSet::new();
        let mut stack: Vec<amp::ChangeHash> = have_deps.to_vec();
        while let Some(hash) = stack.pop() {
            if reachable.insert(hash) {
                if let Some(change) = self.get_change(&hash) {
                    stack.extend(change.deps.iter().copied());
                }
            }
        }
        self.history
            .iter()
            .filter(|(hash, _)| !reachable.contains(hash))
            .map(|(_, change)| change)
            .collect()
    }

    /// Hashes referenced by queued (not-yet-applied) changes but not
    /// present in `history`.
    pub fn get_missing_deps(&self) -> Vec<amp::ChangeHash> {
        let queued: HashSet<amp::ChangeHash> =
            self.queue.iter().map(|(hash, _)| *hash).collect();
        self.queue
            .iter()
            .flat_map(|(_, change)| change.deps.iter().copied())
            .filter(|dep| !self.has_change(dep) && !queued.contains(dep))
            .unique()
            .sorted()
            .collect()
    }

    pub fn clock(&self) -> HashMap<amp::ActorId, u64> {
        self.states
            .iter()
            .map(|(actor, changes)| (actor.clone(), changes.len() as u64))
            .collect()
    }
}
