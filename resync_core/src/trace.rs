// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the sync pass.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`RenderIndex::sync_all`](crate::index::RenderIndex::sync_all) calls at
//! each stage. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`LogSink`] forwards every event to the [`log`] facade.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates the per-entity
//!   [`TraceSink::on_entity_synced`] event.

use crate::dirty_list::GatherOutcome;
#[cfg(feature = "trace-rich")]
use crate::{bits::DirtyBits, path::EntityPath};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a sync pass starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncBeginEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Auxiliary objects with stale fields.
    pub dirty_auxiliaries: usize,
    /// Computation batches queued for ordering.
    pub pending_batches: usize,
}

/// Emitted after the pass worklist has been walked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorklistEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// How the worklist was derived.
    pub outcome: GatherOutcome,
    /// Number of entity ids in the worklist.
    pub len: usize,
}

/// Emitted once per computation batch ordered in a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputationBatchEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Position of the batch in submission order.
    pub batch_index: usize,
    /// Number of computations in the batch.
    pub len: usize,
    /// Whether ordering failed on a dependency cycle.
    pub cycle: bool,
}

/// Per-pass counts, emitted when the pass finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncSummary {
    /// Pass counter.
    pub pass_index: u64,
    /// How the worklist was derived.
    pub outcome: GatherOutcome,
    /// Worklist length.
    pub worklist_len: usize,
    /// Entities whose sync routine ran.
    pub synced: usize,
    /// Worklist entries skipped because their bits read clean.
    pub skipped: usize,
    /// Auxiliary objects whose sync routine ran.
    pub auxiliaries_synced: usize,
    /// Computation batches that failed on a cycle.
    pub failed_batches: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the sync pass.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a pass starts.
    fn on_sync_begin(&mut self, e: &SyncBeginEvent) {
        _ = e;
    }

    /// Called after each computation batch is ordered.
    fn on_computation_batch(&mut self, e: &ComputationBatchEvent) {
        _ = e;
    }

    /// Called once every worklist entry was synchronized or skipped.
    fn on_worklist(&mut self, e: &WorklistEvent) {
        _ = e;
    }

    /// Called with the per-pass summary.
    fn on_sync_summary(&mut self, s: &SyncSummary) {
        _ = s;
    }

    /// Called after each entity sync (requires `trace-rich` feature).
    ///
    /// `dirty_bits` are the bits handed to the sync routine.
    #[cfg(feature = "trace-rich")]
    fn on_entity_synced(&mut self, pass_index: u64, id: &EntityPath, dirty_bits: DirtyBits) {
        _ = (pass_index, id, dirty_bits);
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// A [`TraceSink`] that writes every event to the [`log`] facade.
///
/// Pass-level events go to `debug`, per-entity events to `trace`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn on_sync_begin(&mut self, e: &SyncBeginEvent) {
        log::debug!(
            "pass {}: begin ({} dirty auxiliaries, {} batches)",
            e.pass_index,
            e.dirty_auxiliaries,
            e.pending_batches
        );
    }

    fn on_computation_batch(&mut self, e: &ComputationBatchEvent) {
        if e.cycle {
            log::debug!(
                "pass {}: batch {} ({} computations) has a cycle",
                e.pass_index,
                e.batch_index,
                e.len
            );
        } else {
            log::debug!(
                "pass {}: batch {} ordered {} computations",
                e.pass_index,
                e.batch_index,
                e.len
            );
        }
    }

    fn on_worklist(&mut self, e: &WorklistEvent) {
        log::debug!(
            "pass {}: worklist {:?}, {} entities",
            e.pass_index,
            e.outcome,
            e.len
        );
    }

    fn on_sync_summary(&mut self, s: &SyncSummary) {
        log::debug!(
            "pass {}: synced {} skipped {} auxiliaries {} failed batches {}",
            s.pass_index,
            s.synced,
            s.skipped,
            s.auxiliaries_synced,
            s.failed_batches
        );
    }

    #[cfg(feature = "trace-rich")]
    fn on_entity_synced(&mut self, pass_index: u64, id: &EntityPath, dirty_bits: DirtyBits) {
        log::trace!("pass {pass_index}: synced {id} with {dirty_bits:?}");
    }
}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`SyncBeginEvent`].
    #[inline]
    pub fn sync_begin(&mut self, e: &SyncBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_sync_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ComputationBatchEvent`].
    #[inline]
    pub fn computation_batch(&mut self, e: &ComputationBatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_computation_batch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`WorklistEvent`].
    #[inline]
    pub fn worklist(&mut self, e: &WorklistEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_worklist(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SyncSummary`].
    #[inline]
    pub fn sync_summary(&mut self, s: &SyncSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_sync_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a per-entity sync event (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn entity_synced(&mut self, pass_index: u64, id: &EntityPath, dirty_bits: DirtyBits) {
        if let Some(s) = &mut self.sink {
            s.on_entity_synced(pass_index, id, dirty_bits);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> SyncSummary {
        SyncSummary {
            pass_index: 3,
            outcome: GatherOutcome::Varying,
            worklist_len: 4,
            synced: 3,
            skipped: 1,
            auxiliaries_synced: 0,
            failed_batches: 0,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_sync_begin(&SyncBeginEvent {
            pass_index: 0,
            dirty_auxiliaries: 0,
            pending_batches: 0,
        });
        sink.on_sync_summary(&sample_summary());
    }

    #[test]
    fn log_sink_accepts_every_event() {
        let mut sink = LogSink;
        sink.on_worklist(&WorklistEvent {
            pass_index: 1,
            outcome: GatherOutcome::Full,
            len: 8,
        });
        sink.on_computation_batch(&ComputationBatchEvent {
            pass_index: 1,
            batch_index: 0,
            len: 2,
            cycle: true,
        });
        sink.on_sync_summary(&sample_summary());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.sync_summary(&sample_summary());
        tracer.worklist(&WorklistEvent {
            pass_index: 0,
            outcome: GatherOutcome::Unchanged,
            len: 0,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            passes: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_sync_summary(&mut self, s: &SyncSummary) {
                self.passes.push(s.pass_index);
            }
        }

        let mut sink = RecordingSink { passes: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.sync_summary(&sample_summary());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.passes, &[3]);
    }
}
