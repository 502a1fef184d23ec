// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render index and sync orchestration.
//!
//! The [`RenderIndex`] owns the entity population, the auxiliary objects,
//! the registered [`SceneDelegate`]s and the single [`ChangeTracker`].
//! Scene adapters mutate it through the tracker; once per pass the renderer
//! calls [`sync_all`](RenderIndex::sync_all), which:
//!
//! 1. synchronizes dirty auxiliary objects,
//! 2. orders queued [`ComputationBatch`]es,
//! 3. asks a [`DirtyList`](crate::dirty_list::DirtyList) for the worklist,
//! 4. hands each listed entity its current [`DirtyBits`] and its delegate.
//!
//! Clearing bits is left to each [`Entity::sync`] routine.
//!
//! [`ChangeTracker`]: crate::tracker::ChangeTracker
//! [`ComputationBatch`]: crate::schedule::ComputationBatch
//! [`DirtyBits`]: crate::bits::DirtyBits

mod delegate;
mod store;
mod sync;

pub use delegate::{AuxiliaryObject, DelegateId, Entity, SceneDelegate, SyncContext};
pub use store::RenderIndex;
pub use sync::SyncReport;
