// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change tracking and incremental worklists for retained-mode renderers.
//!
//! `resync_core` sits between an authoritative scene description and the
//! renderer-owned cached entities built from it. Scene adapters report what
//! changed; once per pass the renderer asks which entities it must revisit
//! and gets a minimal, ordered answer, usually without scanning the whole
//! population. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   Scene adapter
//!       │  mark_entity_dirty / insert / remove
//!       ▼
//!   ChangeTracker ──(versions, bits)──► DirtyList::dirty_entities()
//!                                             │  worklist
//!                  ┌──────────────────────────┘
//!                  ▼
//!   RenderIndex::sync_all() ──► Entity::sync(ctx, bits) ──► mark_clean
//!                  │
//!                  ▼
//!   SyncReport ──► par_collect() (post-sync fan-out)
//! ```
//!
//! **[`tracker`]**: Per-entity [`DirtyBits`](bits::DirtyBits), a sticky
//! *varying* flag, and four version counters (scene state, entity index,
//! render tag, varying state).
//!
//! **[`dirty_list`]**: Per-filter cached query with three states (INIT,
//! EMPTY, STABLE). Chooses between a no-op, a full gather, a gather over the
//! varying working set, or reuse of the cached list.
//!
//! **[`gather`]**: Hierarchical filter-and-collect over path-ordered
//! collections.
//!
//! **[`index`]**: The [`RenderIndex`](index::RenderIndex) owning entities,
//! auxiliary objects, scene delegates and the tracker, plus the per-pass
//! [`sync_all`](index::RenderIndex::sync_all) driver.
//!
//! **[`schedule`]**: Dependency ordering for computation batches.
//!
//! **[`parallel`]**: Shard-and-concatenate read-out of id lists (`std`).
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! sync-pass instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper and a [`LogSink`](trace::LogSink).
//!
//! # Concurrency
//!
//! All mutation and all dirty-list queries are single-writer and happen in
//! the sync phase; nothing here locks. Only after a pass completes may the
//! resulting id lists be read from several threads.
//!
//! # Crate features
//!
//! - `std` (enabled by default): Enables the [`parallel`] module and `std`
//!   support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-entity
//!   sync events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod bits;
pub mod dirty_list;
pub mod error;
pub mod filter;
pub mod gather;
pub mod index;
#[cfg(feature = "std")]
pub mod parallel;
pub mod path;
pub mod schedule;
pub mod trace;
pub mod tracker;
