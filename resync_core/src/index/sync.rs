// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-pass sync driver.

use alloc::vec::Vec;

use super::delegate::SyncContext;
use super::store::RenderIndex;
use crate::bits::DirtyBits;
use crate::dirty_list::{DirtyList, GatherOutcome};
use crate::error::{DependencyCycle, SyncError};
use crate::path::EntityPath;
use crate::trace::{ComputationBatchEvent, SyncBeginEvent, SyncSummary, Tracer, WorklistEvent};

/// What one [`RenderIndex::sync_all`] call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    /// Pass counter, starting at 1.
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
    /// One entry per submitted computation batch, in submission order.
    pub computation_orders: Vec<Result<Vec<EntityPath>, DependencyCycle>>,
}

impl SyncReport {
    /// Number of computation batches that failed on a cycle.
    #[must_use]
    pub fn failed_batches(&self) -> usize {
        self.computation_orders.iter().filter(|o| o.is_err()).count()
    }

    /// Condenses the report into a trace summary.
    #[must_use]
    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            pass_index: self.pass_index,
            outcome: self.outcome,
            worklist_len: self.worklist_len,
            synced: self.synced,
            skipped: self.skipped,
            auxiliaries_synced: self.auxiliaries_synced,
            failed_batches: self.failed_batches(),
        }
    }
}

impl RenderIndex {
    /// Runs one synchronization pass for `dirty_list`'s filter.
    ///
    /// Nothing here is fatal: a cycle fails only its own computation batch,
    /// and entities whose bits already read clean are skipped. Calling this
    /// again without any intervening change is safe and does no entity
    /// work.
    pub fn sync_all(&mut self, dirty_list: &mut DirtyList, tracer: &mut Tracer<'_>) -> SyncReport {
        self.pass_index = self.pass_index.wrapping_add(1);
        let pass_index = self.pass_index;
        let dirty_auxiliaries = self.tracker.dirty_auxiliaries();
        tracer.sync_begin(&SyncBeginEvent {
            pass_index,
            dirty_auxiliaries: dirty_auxiliaries.len(),
            pending_batches: self.pending_batches.len(),
        });

        let auxiliaries_synced = self.sync_auxiliaries(&dirty_auxiliaries);
        let computation_orders = self.order_computations(pass_index, tracer);

        // The worklist borrows only the dirty list, so entities can be
        // synchronized straight from it.
        let worklist = dirty_list.refresh(&self.population, &self.tracker, |record| {
            &record.render_tag
        });
        let worklist_len = worklist.len();

        let mut synced = 0;
        let mut skipped = 0;
        for id in worklist {
            match self.sync_entity(id) {
                Some(bits) => {
                    #[cfg(feature = "trace-rich")]
                    tracer.entity_synced(pass_index, id, bits);
                    #[cfg(not(feature = "trace-rich"))]
                    {
                        _ = bits;
                    }
                    synced += 1;
                }
                None => skipped += 1,
            }
        }

        let outcome = dirty_list.last_outcome();
        tracer.worklist(&WorklistEvent {
            pass_index,
            outcome,
            len: worklist_len,
        });

        let report = SyncReport {
            pass_index,
            outcome,
            worklist_len,
            synced,
            skipped,
            auxiliaries_synced,
            computation_orders,
        };
        log::debug!(
            "sync pass {pass_index}: {outcome:?}, {synced}/{worklist_len} entities synced"
        );
        tracer.sync_summary(&report.summary());
        report
    }

    fn sync_auxiliaries(&mut self, ids: &[EntityPath]) -> usize {
        let mut count = 0;
        for id in ids {
            let bits = self.tracker.auxiliary_dirty_bits(id);
            let Some(record) = self.auxiliaries.get_mut(id) else {
                continue;
            };
            let Some(delegate) = self
                .delegates
                .get(record.delegate.0 as usize)
                .and_then(Option::as_deref)
            else {
                log::warn!("{}", SyncError::UnknownDelegate(record.delegate));
                continue;
            };
            let mut ctx = SyncContext::auxiliary(id, delegate, &mut self.tracker);
            record.object.sync(&mut ctx, bits);
            count += 1;
        }
        count
    }

    fn order_computations(
        &mut self,
        pass_index: u64,
        tracer: &mut Tracer<'_>,
    ) -> Vec<Result<Vec<EntityPath>, DependencyCycle>> {
        let batches = core::mem::take(&mut self.pending_batches);
        batches
            .iter()
            .enumerate()
            .map(|(batch_index, batch)| {
                let order = batch.order();
                if let Err(cycle) = &order {
                    log::warn!("batch {batch_index}: {}", SyncError::from(cycle.clone()));
                }
                tracer.computation_batch(&ComputationBatchEvent {
                    pass_index,
                    batch_index,
                    len: batch.len(),
                    cycle: order.is_err(),
                });
                order
            })
            .collect()
    }

    /// Synchronizes one entity, returning the bits it was handed, or `None`
    /// if it was skipped.
    fn sync_entity(&mut self, id: &EntityPath) -> Option<DirtyBits> {
        let bits = self.tracker.entity_dirty_bits(id);
        if bits.is_clean() {
            return None;
        }
        let record = self.population.get_mut(id)?;
        let Some(delegate) = self
            .delegates
            .get(record.delegate.0 as usize)
            .and_then(Option::as_deref)
        else {
            log::warn!("{}", SyncError::UnknownDelegate(record.delegate));
            return None;
        };

        if bits.contains(DirtyBits::RENDER_TAG) {
            let tag = delegate.render_tag(id);
            if tag != record.render_tag {
                record.render_tag = tag;
                self.tracker.mark_render_tags_dirty();
            }
        }

        let mut ctx = SyncContext::entity(id, delegate, &mut self.tracker);
        record.entity.sync(&mut ctx, bits);
        Some(bits)
    }
}
