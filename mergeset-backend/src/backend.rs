//! The public facade: a document's entire mutable surface. Every mutator
//! freezes the backend it was called on and hands back a fresh one, so a
//! caller who kept the old handle around gets a clear `StaleBackend` error
//! instead of silently reading state that's already been superseded.
use std::collections::HashMap;

use mergeset_protocol as amp;
use tracing::instrument;

use crate::{
    change_processor,
    codec,
    error::{MergesetError, Result},
    version_registry::VersionRegistry,
};

#[derive(Debug)]
pub struct Backend {
    registry: VersionRegistry,
    /// Front-end-chosen temporary object ids, resolved the first time they
    /// were used and never evicted for the life of this lineage -- a
    /// later request may still reference an object it created earlier
    /// purely by that temporary id.
    temp_ids: HashMap<String, amp::ObjectId>,
    frozen: bool,
}

impl Backend {
    pub fn init() -> Self {
        Backend {
            registry: VersionRegistry::new(),
            temp_ids: HashMap::new(),
            frozen: false,
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.frozen {
            Err(MergesetError::StaleBackend)
        } else {
            Ok(())
        }
    }

    /// An independent copy of the current state. Does not freeze `self`.
    pub fn clone_backend(&self) -> Result<Backend> {
        self.ensure_live()?;
        Ok(Backend {
            registry: self.registry.clone(),
            temp_ids: self.temp_ids.clone(),
            frozen: false,
        })
    }

    /// Folds a batch of binary changes that already carry canonical ops
    /// (they did not originate from this backend's own `apply_local_change`)
    /// into the document, e.g. changes received from another replica over
    /// the wire.
    #[instrument(skip(self, changes))]
    pub fn apply_changes(&mut self, changes: Vec<Vec<u8>>) -> Result<(Backend, amp::Patch)> {
        self.ensure_live()?;
        let decoded = changes
            .iter()
            .map(|bytes| codec::decode_change(bytes))
            .collect::<Result<Vec<_>>>()?;
        let registry = self.fold_remote(decoded)?;
        let patch = registry.latest().get_patch();
        self.frozen = true;
        Ok((
            Backend {
                registry,
                temp_ids: self.temp_ids.clone(),
                frozen: false,
            },
            patch,
        ))
    }

    /// Like [`Backend::apply_changes`], but does not construct a patch --
    /// for bulk-loading history where nobody is watching the diffs.
    #[instrument(skip(self, changes))]
    pub fn load_changes(&mut self, changes: Vec<Vec<u8>>) -> Result<Backend> {
        self.ensure_live()?;
        let decoded = changes
            .iter()
            .map(|bytes| codec::decode_change(bytes))
            .collect::<Result<Vec<_>>>()?;
        let registry = self.fold_remote(decoded)?;
        self.frozen = true;
        Ok(Backend {
            registry,
            temp_ids: self.temp_ids.clone(),
            frozen: false,
        })
    }

    /// Folds already-decoded changes into a clone of the current registry.
    /// Shared by the binary-change entry points above and by [`Backend::
    /// load`], which works from a whole-document blob rather than per-change
    /// ones and so never needs to round-trip back through `encode_change`.
    fn fold_remote(&self, changes: Vec<amp::Change>) -> Result<VersionRegistry> {
        let mut registry = self.registry.clone();
        for change in changes {
            registry.apply_remote(change)?;
        }
        Ok(registry)
    }

    /// Resolves `request` against the version it was authored against,
    /// folds the result into the current head, and returns the new
    /// backend together with the incremental patch for the author who
    /// made the change.
    #[instrument(skip(self, request))]
    pub fn apply_local_change(
        &mut self,
        request: amp::ChangeRequest,
    ) -> Result<(Backend, amp::Patch)> {
        self.ensure_live()?;
        let base = self.registry.get(request.version)?;
        let latest = self.registry.latest();

        let next_seq = latest.clock().get(&request.actor).copied().unwrap_or(0) + 1;
        if request.seq != next_seq {
            return Err(MergesetError::AlreadyApplied {
                actor: request.actor.clone(),
                seq: request.seq,
            });
        }

        let start_op = latest.max_op + 1;
        let mut temp_ids = self.temp_ids.clone();
        let ops = change_processor::build_ops(latest, &request, start_op, &mut temp_ids)?;
        let change = amp::Change {
            actor: request.actor.clone(),
            seq: request.seq,
            start_op,
            deps: base.heads(),
            time: request.time,
            message: request.message.clone(),
            ops,
        };

        let mut registry = self.registry.clone();
        registry.apply_local(request.version, change)?;
        let mut patch = registry.latest().get_patch();
        patch.actor = Some(request.actor);
        patch.seq = Some(request.seq);

        self.frozen = true;
        Ok((
            Backend {
                registry,
                temp_ids,
                frozen: false,
            },
            patch,
        ))
    }

    pub fn get_patch(&self) -> Result<amp::Patch> {
        self.ensure_live()?;
        Ok(self.registry.latest().get_patch())
    }

    pub fn get_changes(&self, have_deps: &[amp::ChangeHash]) -> Result<Vec<Vec<u8>>> {
        self.ensure_live()?;
        Ok(self
            .registry
            .latest()
            .get_missing_changes(have_deps)
            .into_iter()
            .map(codec::encode_change)
            .collect())
    }

    pub fn get_missing_deps(&self) -> Result<Vec<amp::ChangeHash>> {
        self.ensure_live()?;
        Ok(self.registry.latest().get_missing_deps())
    }

    pub fn get_heads(&self) -> Result<Vec<amp::ChangeHash>> {
        self.ensure_live()?;
        Ok(self.registry.latest().heads())
    }

    /// Serializes the full applied history (not the pending queue).
    pub fn save(&self) -> Result<Vec<u8>> {
        self.ensure_live()?;
        let changes: Vec<amp::Change> = self
            .registry
            .latest()
            .history
            .iter()
            .map(|(_, change)| change.clone())
            .collect();
        Ok(codec::encode_document(&changes))
    }

    pub fn load(bytes: &[u8]) -> Result<Backend> {
        let changes = codec::decode_document(bytes)?;
        let backend = Backend::init();
        let registry = backend.fold_remote(changes)?;
        Ok(Backend {
            registry,
            temp_ids: HashMap::new(),
            frozen: false,
        })
    }
}
