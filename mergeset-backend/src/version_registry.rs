//! A bounded history of op-set snapshots, one per applied change, so a
//! change built against a past version (a lagging author who hasn't seen
//! the latest state) can still be resolved and folded into the current
//! document.
//!
//! Every snapshot is a full clone of the previous one plus one applied
//! change. The reference backend gets this cheaply because its op set is
//! built on persistent, structurally-shared maps throughout; here only the
//! per-object element-id skip lists carry that sharing (see
//! [`crate::skip_list`]), so a snapshot is only as cheap as `OpSet`'s own
//! `HashMap`s allow. `MAX_ENTRIES` bounds how far back a client can lag
//! before its base version simply isn't available any more.
use mergeset_protocol as amp;

use crate::{
    error::{MergesetError, Result},
    op_set::OpSet,
};

const MAX_ENTRIES: usize = 1024;

#[derive(Debug, Clone)]
pub(crate) struct VersionEntry {
    pub version: u64,
    pub local_only: bool,
    pub op_set: OpSet,
}

#[derive(Debug, Clone)]
pub(crate) struct VersionRegistry {
    entries: Vec<VersionEntry>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        VersionRegistry {
            entries: vec![VersionEntry {
                version: 0,
                local_only: false,
                op_set: OpSet::init(),
            }],
        }
    }

    pub fn latest(&self) -> &OpSet {
        &self
            .entries
            .last()
            .expect("a version registry always has at least one entry")
            .op_set
    }

    pub fn latest_version(&self) -> u64 {
        self.entries
            .last()
            .expect("a version registry always has at least one entry")
            .version
    }

    pub fn get(&self, version: u64) -> Result<&OpSet> {
        self.entries
            .iter()
            .find(|e| e.version == version)
            .map(|e| &e.op_set)
            .ok_or(MergesetError::UnknownBaseVersion(version))
    }

    /// Folds a change whose ops are already canonical (it did not
    /// originate as a request against this registry) into the latest
    /// state.
    pub fn apply_remote(&mut self, change: amp::Change) -> Result<u64> {
        let mut op_set = self.latest().clone();
        op_set.add_change(change)?;
        Ok(self.push(op_set, false))
    }

    /// Folds a change resolved from one of this backend's own authors'
    /// requests into the latest state. `base_version` is validated (the
    /// caller already used it to resolve the request) but the change is
    /// always applied on top of the current head, not the stale base, so
    /// it is merged with anything else that landed in the meantime.
    pub fn apply_local(&mut self, base_version: u64, change: amp::Change) -> Result<u64> {
        self.get(base_version)?;
        let mut op_set = self.latest().clone();
        op_set.add_change(change)?;
        Ok(self.push(op_set, true))
    }

    fn push(&mut self, op_set: OpSet, local_only: bool) -> u64 {
        let version = self.latest_version() + 1;
        self.entries.push(VersionEntry {
            version,
            local_only,
            op_set,
        });
        if self.entries.len() > MAX_ENTRIES {
            let drop = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(0..drop);
        }
        version
    }
}
