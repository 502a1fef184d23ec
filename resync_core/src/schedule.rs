// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency ordering for computed data.
//!
//! Computations (computed primvars and the like) may read the results of
//! other computations. Before they run, a batch of them is ordered so that
//! every computation comes after everything it depends on.
//!
//! The ordering is delegated to [`understory_dirty`]: each computation gets a
//! dense `u32` key, every dependency becomes a cycle-checked edge, all keys
//! are marked on one channel, and a deterministic drain yields them in
//! topological order. A cycle fails the whole batch; no partial order is
//! returned.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use understory_dirty::{Channel, CycleHandling, DirtyTracker};

use crate::error::DependencyCycle;
use crate::path::EntityPath;

/// Single channel used for ordering; batches never share a tracker.
const ORDER: Channel = Channel::new(0);

/// A set of computations and the computations each depends on.
///
/// Dependencies that are not keys themselves are still ordered, as leaf
/// computations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComputationBatch {
    dependencies: BTreeMap<EntityPath, BTreeSet<EntityPath>>,
}

impl ComputationBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a computation with no dependencies (if not already present).
    pub fn add_computation(&mut self, id: EntityPath) {
        self.dependencies.entry(id).or_default();
    }

    /// Declares that `dependent` reads the result of `dependency`.
    pub fn add_dependency(&mut self, dependent: EntityPath, dependency: EntityPath) {
        self.dependencies
            .entry(dependent)
            .or_default()
            .insert(dependency);
    }

    /// Returns the number of distinct computations, including leaf-only ones.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut all: BTreeSet<&EntityPath> = self.dependencies.keys().collect();
        all.extend(self.dependencies.values().flatten());
        all.len()
    }

    /// Returns `true` if the batch holds no computations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Returns the raw dependency map.
    #[must_use]
    pub fn dependencies(&self) -> &BTreeMap<EntityPath, BTreeSet<EntityPath>> {
        &self.dependencies
    }

    /// Orders the batch, dependencies first.
    pub fn order(&self) -> Result<Vec<EntityPath>, DependencyCycle> {
        topological_order(&self.dependencies)
    }
}

impl From<BTreeMap<EntityPath, BTreeSet<EntityPath>>> for ComputationBatch {
    fn from(dependencies: BTreeMap<EntityPath, BTreeSet<EntityPath>>) -> Self {
        Self { dependencies }
    }
}

/// Orders `dependencies` so that every computation follows all of its
/// dependencies.
///
/// Ties are broken by path order, so the result is deterministic.
#[expect(
    clippy::cast_possible_truncation,
    reason = "a batch holds far fewer than u32::MAX computations"
)]
pub fn topological_order(
    dependencies: &BTreeMap<EntityPath, BTreeSet<EntityPath>>,
) -> Result<Vec<EntityPath>, DependencyCycle> {
    // Dense keys in path order.
    let mut ids: Vec<&EntityPath> = dependencies.keys().collect();
    ids.extend(dependencies.values().flatten());
    ids.sort_unstable();
    ids.dedup();
    let key_of = |path: &EntityPath| -> u32 {
        // Every path was collected above.
        ids.binary_search(&path).unwrap_or_default() as u32
    };

    let mut tracker = DirtyTracker::<u32>::with_cycle_handling(CycleHandling::Error);
    for (dependent, deps) in dependencies {
        for dependency in deps {
            let cycle = || DependencyCycle {
                dependent: dependent.clone(),
                dependency: dependency.clone(),
            };
            if dependent == dependency {
                return Err(cycle());
            }
            tracker
                .add_dependency(key_of(dependent), key_of(dependency), ORDER)
                .map_err(|_| cycle())?;
        }
    }

    for key in 0..ids.len() as u32 {
        tracker.mark(key, ORDER);
    }
    let order = tracker
        .drain(ORDER)
        .deterministic()
        .run()
        .map(|key| ids[key as usize].clone())
        .collect();
    Ok(order)
}
