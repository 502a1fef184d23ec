// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parallel read-out of a synchronized id list.
//!
//! Once a pass has finished, entity state is stable and an id list can be
//! consumed from many threads. [`par_collect`] splits the list into disjoint
//! shards, gives every worker its own output buffer, and concatenates the
//! buffers in shard order once all workers have joined. Workers never share
//! mutable state, so the collected multiset does not depend on how the list
//! was sharded.
//!
//! Requires the `std` feature.

use alloc::vec::Vec;

use crate::path::EntityPath;

/// Configuration for parallel read-out.
///
/// Use [`Default::default()`] for sensible defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParConfig {
    /// Number of worker threads. `None` uses
    /// [`std::thread::available_parallelism`]. Default: `None`.
    pub num_threads: Option<usize>,
    /// Minimum number of ids per worker. Prevents thread overhead from
    /// dominating small lists. Default: 64.
    pub min_batch_size: usize,
}

impl Default for ParConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            min_batch_size: 64,
        }
    }
}

impl ParConfig {
    fn effective_threads(&self) -> usize {
        self.num_threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    /// Number of workers for a list of `len` ids, at least 1.
    fn workers_for(&self, len: usize) -> usize {
        let by_batch = len.div_ceil(self.min_batch_size.max(1));
        self.effective_threads().min(by_batch).max(1)
    }
}

/// How ids are assigned to workers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Each worker takes one contiguous run. Concatenation reproduces the
    /// single-threaded order.
    #[default]
    Contiguous,
    /// Worker `w` of `n` takes every `n`-th id starting at `w`. Balances
    /// lists whose cost grows along the list; order is not preserved.
    Strided,
}

/// Runs `f` over every id and collects what it pushes.
///
/// `f` receives the id and the calling worker's private buffer. Falls back
/// to the calling thread when the list is too small for more than one
/// worker.
pub fn par_collect<T, F>(
    ids: &[EntityPath],
    config: &ParConfig,
    partition: Partition,
    f: F,
) -> Vec<T>
where
    T: Send,
    F: Fn(&EntityPath, &mut Vec<T>) + Sync,
{
    let workers = config.workers_for(ids.len());
    if workers == 1 {
        let mut out = Vec::new();
        for id in ids {
            f(id, &mut out);
        }
        return out;
    }

    let chunk = ids.len().div_ceil(workers);
    let mut buffers: Vec<Vec<T>> = (0..workers).map(|_| Vec::new()).collect();
    let f = &f;
    std::thread::scope(|scope| {
        for (worker, buffer) in buffers.iter_mut().enumerate() {
            scope.spawn(move || match partition {
                Partition::Contiguous => {
                    for id in ids.iter().skip(worker * chunk).take(chunk) {
                        f(id, buffer);
                    }
                }
                Partition::Strided => {
                    for id in ids.iter().skip(worker).step_by(workers) {
                        f(id, buffer);
                    }
                }
            });
        }
    });

    let mut out = Vec::with_capacity(buffers.iter().map(Vec::len).sum());
    for buffer in buffers {
        out.extend(buffer);
    }
    out
}
