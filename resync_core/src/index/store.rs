// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entity population, auxiliary objects and delegate registry.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use super::delegate::{AuxiliaryObject, DelegateId, Entity, SceneDelegate};
use crate::error::SyncError;
use crate::filter::RenderTag;
use crate::path::EntityPath;
use crate::schedule::ComputationBatch;
use crate::tracker::ChangeTracker;

/// One tracked entity.
pub(crate) struct EntityRecord {
    pub(crate) delegate: DelegateId,
    pub(crate) render_tag: RenderTag,
    pub(crate) entity: Box<dyn Entity>,
}

pub(crate) struct AuxiliaryRecord {
    pub(crate) delegate: DelegateId,
    pub(crate) object: Box<dyn AuxiliaryObject>,
}

/// Owner of every renderer-side cached object and of the change tracker.
///
/// The index itself is not versioned; all versioning lives in the
/// [`ChangeTracker`].
pub struct RenderIndex {
    // -- Invalidation --
    pub(crate) tracker: ChangeTracker,

    // -- Delegates --
    pub(crate) delegates: Vec<Option<Box<dyn SceneDelegate>>>,

    // -- Population --
    pub(crate) population: BTreeMap<EntityPath, EntityRecord>,
    pub(crate) auxiliaries: BTreeMap<EntityPath, AuxiliaryRecord>,

    // -- Pass state --
    pub(crate) pending_batches: Vec<ComputationBatch>,
    pub(crate) pass_index: u64,
}

impl fmt::Debug for RenderIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderIndex")
            .field("tracker", &self.tracker)
            .field(
                "delegates",
                &self.delegates.iter().filter(|d| d.is_some()).count(),
            )
            .field("entities", &self.population.len())
            .field("auxiliaries", &self.auxiliaries.len())
            .field("pending_batches", &self.pending_batches.len())
            .field("pass_index", &self.pass_index)
            .finish()
    }
}

impl Default for RenderIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracker: ChangeTracker::new(),
            delegates: Vec::new(),
            population: BTreeMap::new(),
            auxiliaries: BTreeMap::new(),
            pending_batches: Vec::new(),
            pass_index: 0,
        }
    }

    // -- Delegates --

    /// Registers a scene delegate.
    pub fn insert_delegate(&mut self, delegate: Box<dyn SceneDelegate>) -> DelegateId {
        let slot = self.delegates.len();
        self.delegates.push(Some(delegate));
        DelegateId(u32::try_from(slot).unwrap_or(u32::MAX))
    }

    /// Unregisters a delegate and removes everything it owns.
    ///
    /// Returns `false` if the delegate was not registered.
    pub fn remove_delegate(&mut self, id: DelegateId) -> bool {
        let Some(slot) = self.delegates.get_mut(id.0 as usize) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }

        let entities: Vec<_> = self
            .population
            .iter()
            .filter(|(_, r)| r.delegate == id)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &entities {
            self.remove_entity(path);
        }
        let auxiliaries: Vec<_> = self
            .auxiliaries
            .iter()
            .filter(|(_, r)| r.delegate == id)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &auxiliaries {
            self.remove_auxiliary(path);
        }
        true
    }

    pub(crate) fn delegate(&self, id: DelegateId) -> Option<&dyn SceneDelegate> {
        self.delegates.get(id.0 as usize).and_then(Option::as_deref)
    }

    // -- Entities --

    /// Starts tracking an entity owned by `delegate`.
    ///
    /// The entity's render tag is read from the delegate and all of its bits
    /// start dirty. Inserting an existing path replaces the old entity.
    pub fn insert_entity(
        &mut self,
        delegate: DelegateId,
        id: EntityPath,
        entity: Box<dyn Entity>,
    ) -> Result<(), SyncError> {
        let render_tag = self
            .delegate(delegate)
            .ok_or(SyncError::UnknownDelegate(delegate))?
            .render_tag(&id);
        self.population.insert(
            id.clone(),
            EntityRecord {
                delegate,
                render_tag,
                entity,
            },
        );
        self.tracker.insert_entity(id);
        Ok(())
    }

    /// Stops tracking an entity and hands it back.
    ///
    /// Logs and returns `None` for unknown ids.
    pub fn remove_entity(&mut self, id: &EntityPath) -> Option<Box<dyn Entity>> {
        match self.population.remove(id) {
            Some(record) => {
                self.tracker.remove_entity(id);
                Some(record.entity)
            }
            None => {
                log::warn!(
                    "remove_entity: {}",
                    SyncError::UnknownEntityReference(id.clone())
                );
                None
            }
        }
    }

    /// Removes every entity and auxiliary object at or below `root`.
    ///
    /// Returns the number of objects removed.
    pub fn remove_subtree(&mut self, root: &EntityPath) -> usize {
        let entities = subtree_keys(&self.population, root);
        let auxiliaries = subtree_keys(&self.auxiliaries, root);
        for path in &entities {
            self.remove_entity(path);
        }
        for path in &auxiliaries {
            self.remove_auxiliary(path);
        }
        entities.len() + auxiliaries.len()
    }

    /// Returns the entity at `id`.
    #[must_use]
    pub fn entity(&self, id: &EntityPath) -> Option<&dyn Entity> {
        self.population.get(id).map(|r| &*r.entity)
    }

    /// Returns the render tag cached for `id`.
    #[must_use]
    pub fn entity_render_tag(&self, id: &EntityPath) -> Option<&RenderTag> {
        self.population.get(id).map(|r| &r.render_tag)
    }

    /// Iterates entity ids in path order.
    pub fn entity_ids(&self) -> impl Iterator<Item = &EntityPath> {
        self.population.keys()
    }

    /// Returns whether `id` is a tracked entity.
    #[must_use]
    pub fn contains_entity(&self, id: &EntityPath) -> bool {
        self.population.contains_key(id)
    }

    /// Returns the number of tracked entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.population.len()
    }

    pub(crate) fn population(&self) -> &BTreeMap<EntityPath, EntityRecord> {
        &self.population
    }

    // -- Auxiliary objects --

    /// Starts tracking a non-entity object owned by `delegate`.
    pub fn insert_auxiliary(
        &mut self,
        delegate: DelegateId,
        id: EntityPath,
        object: Box<dyn AuxiliaryObject>,
    ) -> Result<(), SyncError> {
        if self.delegate(delegate).is_none() {
            return Err(SyncError::UnknownDelegate(delegate));
        }
        self.auxiliaries
            .insert(id.clone(), AuxiliaryRecord { delegate, object });
        self.tracker.insert_auxiliary(id);
        Ok(())
    }

    /// Stops tracking a non-entity object and hands it back.
    pub fn remove_auxiliary(&mut self, id: &EntityPath) -> Option<Box<dyn AuxiliaryObject>> {
        let record = self.auxiliaries.remove(id);
        // The tracker logs unknown ids.
        self.tracker.remove_auxiliary(id);
        record.map(|r| r.object)
    }

    /// Returns whether `id` is a tracked auxiliary object.
    #[must_use]
    pub fn contains_auxiliary(&self, id: &EntityPath) -> bool {
        self.auxiliaries.contains_key(id)
    }

    // -- Tracker access --

    /// Returns the change tracker.
    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Returns the change tracker for marking.
    #[inline]
    pub fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }

    // -- Computations --

    /// Queues a computation batch to be ordered by the next
    /// [`sync_all`](Self::sync_all).
    pub fn submit_computations(&mut self, batch: ComputationBatch) {
        self.pending_batches.push(batch);
    }

    /// Number of passes run so far.
    #[inline]
    #[must_use]
    pub fn pass_index(&self) -> u64 {
        self.pass_index
    }
}

fn subtree_keys<V>(map: &BTreeMap<EntityPath, V>, root: &EntityPath) -> Vec<EntityPath> {
    map.range(root.clone()..)
        .take_while(|(path, _)| path.has_prefix(root))
        .map(|(path, _)| path.clone())
        .collect()
}
