// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Versioned invalidation ledger.
//!
//! [`ChangeTracker`] is the single source of truth for "what changed". It
//! stores a [`DirtyBits`] mask plus a sticky *varying* flag per entity, and
//! four monotonically increasing counters at different granularities:
//!
//! | Counter | Bumped by |
//! |---|---|
//! | scene state | every mutation that could affect a query |
//! | entity index | insert / remove |
//! | render tag | structural dirty bits, [`mark_render_tags_dirty`] |
//! | varying state | an entity entering the working set, [`reset_varying_state`] |
//!
//! Whenever one of the narrower counters moves, the scene-state counter moves
//! with it, so a consumer that sees an unchanged scene-state version can skip
//! all further comparisons.
//!
//! # Varying working set
//!
//! The first non-clean mark on an entity since the last
//! [`reset_varying_state`] flags it *varying* and bumps the varying-state
//! version. The flag survives [`mark_entity_clean`], so an entity that is
//! dirtied and synchronized every pass stays in the steady-state working set
//! without any per-mark bookkeeping. [`reset_varying_state`] shrinks the set
//! back to the entities that are dirty right now.
//!
//! Insertion seeds [`DirtyBits::ALL_DIRTY`], which counts as the first
//! non-clean mark, so freshly inserted entities start out varying.
//!
//! [`mark_render_tags_dirty`]: ChangeTracker::mark_render_tags_dirty
//! [`reset_varying_state`]: ChangeTracker::reset_varying_state
//! [`mark_entity_clean`]: ChangeTracker::mark_entity_clean

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::bits::{DirtyBits, EntityState};
use crate::error::SyncError;
use crate::path::EntityPath;

#[derive(Clone, Copy, Debug, Default)]
struct EntityEntry {
    bits: DirtyBits,
    varying: bool,
}

/// Per-entity dirty bits and global version counters.
///
/// Owned by the [`RenderIndex`](crate::index::RenderIndex); all mutation is
/// single-writer and happens during the sync phase.
#[derive(Debug)]
pub struct ChangeTracker {
    // -- Entities --
    entities: HashMap<EntityPath, EntityEntry>,
    varying: BTreeSet<EntityPath>,

    // -- Auxiliary objects --
    auxiliaries: HashMap<EntityPath, DirtyBits>,

    // -- Named collections --
    collections: BTreeMap<String, u64>,

    // -- Versions --
    scene_state_version: u64,
    entity_index_version: u64,
    render_tag_version: u64,
    varying_state_version: u64,
    auxiliary_index_version: u64,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeTracker {
    /// Creates an empty tracker.
    ///
    /// All versions start at 1 so that a zero-initialized baseline never
    /// matches.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            varying: BTreeSet::new(),
            auxiliaries: HashMap::new(),
            collections: BTreeMap::new(),
            scene_state_version: 1,
            entity_index_version: 1,
            render_tag_version: 1,
            varying_state_version: 1,
            auxiliary_index_version: 1,
        }
    }

    // -- Population --

    /// Starts tracking `id` with every field dirty.
    ///
    /// Re-inserting a tracked id reseeds its bits.
    pub fn insert_entity(&mut self, id: EntityPath) {
        self.entities.insert(
            id.clone(),
            EntityEntry {
                bits: DirtyBits::ALL_DIRTY,
                varying: true,
            },
        );
        self.varying.insert(id);
        self.bump_entity_index();
    }

    /// Stops tracking `id`.
    ///
    /// Logs and ignores unknown ids.
    pub fn remove_entity(&mut self, id: &EntityPath) {
        if let Err(err) = self.try_remove_entity(id) {
            log::warn!("remove_entity: {err}");
        }
    }

    /// Like [`remove_entity`](Self::remove_entity), but reports unknown ids.
    pub fn try_remove_entity(&mut self, id: &EntityPath) -> Result<(), SyncError> {
        if self.entities.remove(id).is_none() {
            return Err(SyncError::UnknownEntityReference(id.clone()));
        }
        self.varying.remove(id);
        self.bump_entity_index();
        Ok(())
    }

    /// Returns whether `id` is tracked.
    #[must_use]
    pub fn contains_entity(&self, id: &EntityPath) -> bool {
        self.entities.contains_key(id)
    }

    /// Returns the number of tracked entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- Marking --

    /// ORs `bits` into the entity's mask.
    ///
    /// Always bumps the scene-state version. Structural bits also bump the
    /// render-tag version; the first non-clean mark since the last
    /// [`reset_varying_state`](Self::reset_varying_state) also bumps the
    /// varying-state version. Logs and ignores unknown ids.
    pub fn mark_entity_dirty(&mut self, id: &EntityPath, bits: DirtyBits) {
        if let Err(err) = self.try_mark_entity_dirty(id, bits) {
            log::warn!("mark_entity_dirty: {err}");
        }
    }

    /// Like [`mark_entity_dirty`](Self::mark_entity_dirty), but reports
    /// unknown ids.
    pub fn try_mark_entity_dirty(
        &mut self,
        id: &EntityPath,
        bits: DirtyBits,
    ) -> Result<(), SyncError> {
        let entry = self
            .entities
            .get_mut(id)
            .ok_or_else(|| SyncError::UnknownEntityReference(id.clone()))?;
        entry.bits |= bits;
        let entered_working_set = !entry.varying && !bits.is_clean();
        if entered_working_set {
            entry.varying = true;
        }

        if entered_working_set {
            self.varying.insert(id.clone());
            self.varying_state_version = self.varying_state_version.wrapping_add(1);
        }
        if bits.is_structural() {
            self.render_tag_version = self.render_tag_version.wrapping_add(1);
        }
        self.bump_scene_state();
        Ok(())
    }

    /// Marks every tracked entity with `bits`, bumping each counter at most
    /// once.
    pub fn mark_all_entities_dirty(&mut self, bits: DirtyBits) {
        let mut entered_working_set = false;
        for (id, entry) in &mut self.entities {
            entry.bits |= bits;
            if !entry.varying && !bits.is_clean() {
                entry.varying = true;
                self.varying.insert(id.clone());
                entered_working_set = true;
            }
        }
        if entered_working_set {
            self.varying_state_version = self.varying_state_version.wrapping_add(1);
        }
        if bits.is_structural() {
            self.render_tag_version = self.render_tag_version.wrapping_add(1);
        }
        self.bump_scene_state();
    }

    /// Clears the entity's bits, keeping its varying flag.
    ///
    /// Cleaning is the result of synchronization, not a new change, so no
    /// version moves. Logs and ignores unknown ids.
    pub fn mark_entity_clean(&mut self, id: &EntityPath) {
        match self.entities.get_mut(id) {
            Some(entry) => entry.bits = DirtyBits::CLEAN,
            None => log::warn!(
                "mark_entity_clean: {}",
                SyncError::UnknownEntityReference(id.clone())
            ),
        }
    }

    /// Forces every pass filter to re-gather.
    ///
    /// Used when an entity's render tag changed during synchronization.
    pub fn mark_render_tags_dirty(&mut self) {
        self.render_tag_version = self.render_tag_version.wrapping_add(1);
        self.bump_scene_state();
    }

    /// Shrinks the varying working set to the entities that are dirty now.
    pub fn reset_varying_state(&mut self) {
        self.varying.clear();
        for (id, entry) in &mut self.entities {
            entry.varying = !entry.bits.is_clean();
            if entry.varying {
                self.varying.insert(id.clone());
            }
        }
        self.varying_state_version = self.varying_state_version.wrapping_add(1);
        self.bump_scene_state();
    }

    // -- Queries --

    /// Returns the entity's dirty bits.
    ///
    /// Unknown ids are logged and read as [`DirtyBits::CLEAN`]; transient
    /// lookups during teardown are expected.
    #[must_use]
    pub fn entity_dirty_bits(&self, id: &EntityPath) -> DirtyBits {
        self.try_entity_dirty_bits(id).unwrap_or_else(|err| {
            log::warn!("entity_dirty_bits: {err}");
            DirtyBits::CLEAN
        })
    }

    /// Like [`entity_dirty_bits`](Self::entity_dirty_bits), but reports
    /// unknown ids.
    pub fn try_entity_dirty_bits(&self, id: &EntityPath) -> Result<DirtyBits, SyncError> {
        self.entities
            .get(id)
            .map(|e| e.bits)
            .ok_or_else(|| SyncError::UnknownEntityReference(id.clone()))
    }

    /// Returns whether the entity is in the varying working set.
    #[must_use]
    pub fn is_varying(&self, id: &EntityPath) -> bool {
        self.entities.get(id).is_some_and(|e| e.varying)
    }

    /// Returns the entity's coarse state, or `None` for unknown ids.
    #[must_use]
    pub fn entity_state(&self, id: &EntityPath) -> Option<EntityState> {
        self.entities
            .get(id)
            .map(|e| EntityState::from_parts(e.bits, e.varying))
    }

    /// Returns the varying working set in path order.
    pub fn varying_entities(&self) -> impl Iterator<Item = &EntityPath> {
        self.varying.iter()
    }

    pub(crate) fn varying_set(&self) -> &BTreeSet<EntityPath> {
        &self.varying
    }

    pub(crate) fn entry(&self, id: &EntityPath) -> Option<(DirtyBits, bool)> {
        self.entities.get(id).map(|e| (e.bits, e.varying))
    }

    // -- Versions --

    /// Bumped on every mutation that could affect an entity query.
    #[inline]
    #[must_use]
    pub fn scene_state_version(&self) -> u64 {
        self.scene_state_version
    }

    /// Bumped on entity insertion and removal.
    #[inline]
    #[must_use]
    pub fn entity_index_version(&self) -> u64 {
        self.entity_index_version
    }

    /// Bumped when tag or representation membership may have changed.
    #[inline]
    #[must_use]
    pub fn render_tag_version(&self) -> u64 {
        self.render_tag_version
    }

    /// Bumped when the varying working set changes.
    #[inline]
    #[must_use]
    pub fn varying_state_version(&self) -> u64 {
        self.varying_state_version
    }

    // -- Named collections --

    /// Bumps the version of the named collection.
    pub fn mark_collection_dirty(&mut self, name: &str) {
        match self.collections.get_mut(name) {
            Some(v) => *v = v.wrapping_add(1),
            None => {
                self.collections.insert(String::from(name), 1);
            }
        }
        self.bump_scene_state();
    }

    /// Bumps the version of every known collection.
    pub fn mark_all_collections_dirty(&mut self) {
        for v in self.collections.values_mut() {
            *v = v.wrapping_add(1);
        }
        self.bump_scene_state();
    }

    /// Returns the version of the named collection.
    ///
    /// The value also moves whenever the entity population changes, so a
    /// cached collection is invalidated by inserts and removals too.
    #[must_use]
    pub fn collection_version(&self, name: &str) -> u64 {
        self.collections
            .get(name)
            .copied()
            .unwrap_or(0)
            .wrapping_add(self.entity_index_version)
    }

    // -- Auxiliary objects --

    /// Starts tracking a non-entity scene object with every field dirty.
    pub fn insert_auxiliary(&mut self, id: EntityPath) {
        self.auxiliaries.insert(id, DirtyBits::ALL_DIRTY);
        self.auxiliary_index_version = self.auxiliary_index_version.wrapping_add(1);
    }

    /// Stops tracking a non-entity scene object. Logs unknown ids.
    pub fn remove_auxiliary(&mut self, id: &EntityPath) {
        if self.auxiliaries.remove(id).is_some() {
            self.auxiliary_index_version = self.auxiliary_index_version.wrapping_add(1);
        } else {
            log::warn!(
                "remove_auxiliary: {}",
                SyncError::UnknownEntityReference(id.clone())
            );
        }
    }

    /// ORs `bits` into an auxiliary object's mask. Logs unknown ids.
    pub fn mark_auxiliary_dirty(&mut self, id: &EntityPath, bits: DirtyBits) {
        match self.auxiliaries.get_mut(id) {
            Some(b) => *b |= bits,
            None => log::warn!(
                "mark_auxiliary_dirty: {}",
                SyncError::UnknownEntityReference(id.clone())
            ),
        }
    }

    /// Clears an auxiliary object's bits. Logs unknown ids.
    pub fn mark_auxiliary_clean(&mut self, id: &EntityPath) {
        match self.auxiliaries.get_mut(id) {
            Some(b) => *b = DirtyBits::CLEAN,
            None => log::warn!(
                "mark_auxiliary_clean: {}",
                SyncError::UnknownEntityReference(id.clone())
            ),
        }
    }

    /// Returns an auxiliary object's bits; unknown ids read as clean.
    #[must_use]
    pub fn auxiliary_dirty_bits(&self, id: &EntityPath) -> DirtyBits {
        self.auxiliaries.get(id).copied().unwrap_or(DirtyBits::CLEAN)
    }

    /// Returns the auxiliary objects with any stale field, in path order.
    #[must_use]
    pub fn dirty_auxiliaries(&self) -> Vec<EntityPath> {
        let mut ids: Vec<_> = self
            .auxiliaries
            .iter()
            .filter(|(_, bits)| !bits.is_clean())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Bumped on auxiliary insertion and removal.
    #[inline]
    #[must_use]
    pub fn auxiliary_index_version(&self) -> u64 {
        self.auxiliary_index_version
    }

    // -- Internal helpers --

    fn bump_entity_index(&mut self) {
        self.entity_index_version = self.entity_index_version.wrapping_add(1);
        self.bump_scene_state();
    }

    fn bump_scene_state(&mut self) {
        self.scene_state_version = self.scene_state_version.wrapping_add(1);
    }
}
