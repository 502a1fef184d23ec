// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-entity dirty bits.
//!
//! Each entity carries a [`DirtyBits`] mask naming which of its data fields
//! are stale relative to its scene delegate. Fields fall into two classes:
//!
//! - **Structural**: [`INIT_REPR`], [`REPR`] and [`RENDER_TAG`] change which
//!   passes and representations an entity belongs to. Marking one of them
//!   bumps the tracker's render-tag version, which forces every
//!   [`DirtyList`](crate::dirty_list::DirtyList) into a full gather.
//!
//! - **Varying-eligible**: everything else (geometry, transform, material,
//!   primvars). Marking these only moves the entity into the steady-state
//!   working set.
//!
//! [`INIT_REPR`]: DirtyBits::INIT_REPR
//! [`REPR`]: DirtyBits::REPR
//! [`RENDER_TAG`]: DirtyBits::RENDER_TAG

use bitflags::bitflags;

bitflags! {
    /// Stale data fields of a single entity.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtyBits: u32 {
        /// A representation has to be created before first use.
        const INIT_REPR = 1 << 0;
        /// Object-to-world transform.
        const TRANSFORM = 1 << 1;
        /// Local bounds.
        const EXTENT = 1 << 2;
        /// Point positions.
        const POINTS = 1 << 3;
        /// Face/edge topology.
        const TOPOLOGY = 1 << 4;
        /// Normals.
        const NORMALS = 1 << 5;
        /// Visibility flag.
        const VISIBILITY = 1 << 6;
        /// Bound material.
        const MATERIAL_ID = 1 << 7;
        /// Any other primvar.
        const PRIMVAR = 1 << 8;
        /// Double-sidedness.
        const DOUBLE_SIDED = 1 << 9;
        /// Instancer binding.
        const INSTANCER = 1 << 10;
        /// Representation selection.
        const REPR = 1 << 11;
        /// Render tag classification.
        const RENDER_TAG = 1 << 12;
    }
}

impl DirtyBits {
    /// Nothing is stale.
    pub const CLEAN: Self = Self::empty();

    /// Every field is stale. Seeded on insertion.
    pub const ALL_DIRTY: Self = Self::all();

    /// Fields that affect population or filter membership.
    pub const STRUCTURAL: Self = Self::INIT_REPR.union(Self::REPR).union(Self::RENDER_TAG);

    /// Fields that only affect an entity's own data.
    pub const VARYING_ELIGIBLE: Self = Self::ALL_DIRTY.difference(Self::STRUCTURAL);

    /// Returns `true` if no field is stale.
    #[inline]
    #[must_use]
    pub const fn is_clean(self) -> bool {
        self.is_empty()
    }

    /// Returns `true` if any structural field is set.
    #[inline]
    #[must_use]
    pub const fn is_structural(self) -> bool {
        self.intersects(Self::STRUCTURAL)
    }
}

/// Coarse synchronization state of one entity.
///
/// Derived from the raw [`DirtyBits`] plus the tracker's sticky varying flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// No stale fields and not part of the steady-state working set.
    Clean,
    /// At least one stale field.
    Dirty,
    /// No stale fields right now, but changed since the last
    /// [`reset_varying_state`](crate::tracker::ChangeTracker::reset_varying_state).
    SteadyStateVarying,
}

impl EntityState {
    pub(crate) const fn from_parts(bits: DirtyBits, varying: bool) -> Self {
        if !bits.is_clean() {
            Self::Dirty
        } else if varying {
            Self::SteadyStateVarying
        } else {
            Self::Clean
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_and_varying_partition_all_dirty() {
        assert_eq!(
            DirtyBits::STRUCTURAL | DirtyBits::VARYING_ELIGIBLE,
            DirtyBits::ALL_DIRTY
        );
        assert!(!DirtyBits::STRUCTURAL.intersects(DirtyBits::VARYING_ELIGIBLE));
    }

    #[test]
    fn structural_classification() {
        assert!(DirtyBits::RENDER_TAG.is_structural());
        assert!((DirtyBits::POINTS | DirtyBits::REPR).is_structural());
        assert!(!(DirtyBits::TRANSFORM | DirtyBits::PRIMVAR).is_structural());
        assert!(DirtyBits::CLEAN.is_clean());
    }

    #[test]
    fn state_from_parts() {
        assert_eq!(
            EntityState::from_parts(DirtyBits::CLEAN, false),
            EntityState::Clean
        );
        assert_eq!(
            EntityState::from_parts(DirtyBits::POINTS, true),
            EntityState::Dirty
        );
        assert_eq!(
            EntityState::from_parts(DirtyBits::CLEAN, true),
            EntityState::SteadyStateVarying
        );
    }
}
