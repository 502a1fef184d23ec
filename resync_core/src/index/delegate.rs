// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contracts between the render index and its external collaborators.

use alloc::vec::Vec;
use core::fmt;

use crate::bits::DirtyBits;
use crate::filter::RenderTag;
use crate::path::EntityPath;
use crate::tracker::ChangeTracker;

/// Handle to a [`SceneDelegate`] registered with a
/// [`RenderIndex`](super::RenderIndex).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelegateId(pub(crate) u32);

impl DelegateId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for DelegateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DelegateId({})", self.0)
    }
}

/// Authoritative source of per-entity data.
///
/// Consulted only while an entity synchronizes, synchronously, from the
/// sync thread. Every getter has a neutral default so adapters implement
/// only what their scene description carries.
pub trait SceneDelegate {
    /// Classification of `id` for pass filtering.
    fn render_tag(&self, id: &EntityPath) -> RenderTag {
        _ = id;
        RenderTag::geometry()
    }

    /// Row-major object-to-world matrix.
    fn transform(&self, id: &EntityPath) -> [f64; 16] {
        _ = id;
        [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]
    }

    /// Whether `id` should be drawn.
    fn visible(&self, id: &EntityPath) -> bool {
        _ = id;
        true
    }

    /// Material bound to `id`, if any.
    fn material_id(&self, id: &EntityPath) -> Option<EntityPath> {
        _ = id;
        None
    }

    /// Point positions of `id`.
    fn points(&self, id: &EntityPath) -> Vec<[f32; 3]> {
        _ = id;
        Vec::new()
    }
}

/// A renderer-owned cached entity.
pub trait Entity {
    /// Pulls the fields named by `dirty_bits` from `ctx.delegate()`.
    ///
    /// Clearing the bits is this routine's job, usually by calling
    /// [`SyncContext::mark_clean`] once the data is cached. Bits left set
    /// stay dirty for the next pass.
    fn sync(&mut self, ctx: &mut SyncContext<'_>, dirty_bits: DirtyBits);
}

/// A renderer-owned cached non-entity object (camera, light, material).
///
/// Auxiliary objects are synchronized before any entity, so entity sync
/// routines may read their results.
pub trait AuxiliaryObject {
    /// Pulls the fields named by `dirty_bits` from `ctx.delegate()`.
    fn sync(&mut self, ctx: &mut SyncContext<'_>, dirty_bits: DirtyBits);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SyncTarget {
    Entity,
    Auxiliary,
}

/// What a sync routine may touch while it runs.
pub struct SyncContext<'a> {
    id: &'a EntityPath,
    delegate: &'a dyn SceneDelegate,
    tracker: &'a mut ChangeTracker,
    target: SyncTarget,
}

impl fmt::Debug for SyncContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("id", self.id)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<'a> SyncContext<'a> {
    pub(crate) fn entity(
        id: &'a EntityPath,
        delegate: &'a dyn SceneDelegate,
        tracker: &'a mut ChangeTracker,
    ) -> Self {
        Self {
            id,
            delegate,
            tracker,
            target: SyncTarget::Entity,
        }
    }

    pub(crate) fn auxiliary(
        id: &'a EntityPath,
        delegate: &'a dyn SceneDelegate,
        tracker: &'a mut ChangeTracker,
    ) -> Self {
        Self {
            id,
            delegate,
            tracker,
            target: SyncTarget::Auxiliary,
        }
    }

    /// Path of the object being synchronized.
    #[must_use]
    pub fn id(&self) -> &EntityPath {
        self.id
    }

    /// Delegate that owns the object.
    #[must_use]
    pub fn delegate(&self) -> &dyn SceneDelegate {
        self.delegate
    }

    /// The index's change tracker.
    ///
    /// Sync routines may mark other objects dirty; those changes are picked
    /// up by the next pass.
    pub fn tracker(&mut self) -> &mut ChangeTracker {
        self.tracker
    }

    /// Clears the dirty bits of the object being synchronized.
    pub fn mark_clean(&mut self) {
        match self.target {
            SyncTarget::Entity => self.tracker.mark_entity_clean(self.id),
            SyncTarget::Auxiliary => self.tracker.mark_auxiliary_clean(self.id),
        }
    }
}
