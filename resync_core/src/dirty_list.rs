// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-filter cached worklist.
//!
//! A [`DirtyList`] answers "which entities must this pass revisit?" for one
//! [`DirtyListFilter`]. It remembers the tracker versions it last observed
//! and picks the cheapest way to bring its cached list up to date:
//!
//! ```text
//!   scene version unchanged ──────────────► []            (Unchanged)
//!   index or render-tag version changed ──► full gather   (Full)
//!   varying version changed ──────────────► varying gather (Varying)
//!   otherwise ────────────────────────────► cached list   (Reused)
//! ```
//!
//! A full gather keeps entities whose bits are dirty in a field the filter
//! cares about. A varying gather walks only the tracker's varying working
//! set and keeps every member that passes the tag and root checks, whatever
//! its current bits. An entity that is dirtied and synchronized every pass
//! stays in the list without any full re-scan, and a varying entity dirtied
//! later in a relevant field is already listed when the cache is reused.
//!
//! Changing the filter puts the list back into [`DirtyListState::Init`],
//! which forces a full gather on the next query regardless of versions.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::SyncError;
use crate::filter::{DirtyListFilter, RenderTag, ReprSelector};
use crate::gather::gather;
use crate::index::RenderIndex;
use crate::path::EntityPath;
use crate::tracker::ChangeTracker;

/// Cache state of a [`DirtyList`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DirtyListState {
    /// Fresh, or the filter just changed. The next query does a full gather.
    #[default]
    Init,
    /// The last query found nothing new and returned an empty list.
    Empty,
    /// The cached list is valid for the observed versions.
    Stable,
}

/// How the most recent query produced its result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GatherOutcome {
    /// Nothing changed; the empty list was returned.
    #[default]
    Unchanged,
    /// The whole population was walked.
    Full,
    /// Only the varying working set was walked.
    Varying,
    /// The previous list was returned as is.
    Reused,
}

/// Cached query for one filter.
#[derive(Clone, Debug, Default)]
pub struct DirtyList {
    filter: DirtyListFilter,
    state: DirtyListState,
    outcome: GatherOutcome,

    // -- Observed tracker versions --
    scene_state_version: u64,
    entity_index_version: u64,
    render_tag_version: u64,
    varying_state_version: u64,

    entities: Vec<EntityPath>,
}

impl DirtyList {
    /// Creates a list for the given filter.
    #[must_use]
    pub fn new(filter: DirtyListFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Returns the entities the current pass must synchronize.
    ///
    /// Returns an empty slice when nothing changed since the previous call,
    /// so callers must hold on to the result for the duration of a pass
    /// rather than query again.
    pub fn dirty_entities(&mut self, index: &RenderIndex) -> &[EntityPath] {
        self.refresh(index.population(), index.tracker(), |record| {
            &record.render_tag
        })
    }

    /// Core query over an arbitrary population.
    pub(crate) fn refresh<V, T>(
        &mut self,
        population: &BTreeMap<EntityPath, V>,
        tracker: &ChangeTracker,
        tag_of: T,
    ) -> &[EntityPath]
    where
        T: Fn(&V) -> &RenderTag,
    {
        let scene = tracker.scene_state_version();
        if self.state != DirtyListState::Init && scene == self.scene_state_version {
            self.state = DirtyListState::Empty;
            self.outcome = GatherOutcome::Unchanged;
            return &[];
        }
        self.scene_state_version = scene;

        let index = tracker.entity_index_version();
        let tags = tracker.render_tag_version();
        if self.state == DirtyListState::Init
            || index != self.entity_index_version
            || tags != self.render_tag_version
        {
            self.entity_index_version = index;
            self.render_tag_version = tags;
            self.entities = full_gather(&self.filter, population, tracker, &tag_of);
            // Force the next steady-state comparison to re-derive.
            self.varying_state_version = tracker.varying_state_version().wrapping_sub(1);
            self.outcome = GatherOutcome::Full;
        } else if tracker.varying_state_version() != self.varying_state_version {
            self.varying_state_version = tracker.varying_state_version();
            self.entities = varying_gather(&self.filter, population, tracker, &tag_of);
            self.outcome = GatherOutcome::Varying;
        } else {
            self.outcome = GatherOutcome::Reused;
        }
        log::trace!(
            "dirty list {:?}: {} entities at scene version {scene}",
            self.outcome,
            self.entities.len()
        );

        self.state = DirtyListState::Stable;
        &self.entities
    }

    // -- Filter configuration --

    /// Replaces the tracked render tags and representation selectors.
    ///
    /// Always forces a full gather on the next query.
    pub fn update_tracked_criteria(
        &mut self,
        render_tags: Vec<RenderTag>,
        repr_selectors: Vec<ReprSelector>,
    ) {
        self.filter.render_tags = render_tags;
        self.filter.repr_selectors = repr_selectors;
        self.state = DirtyListState::Init;
    }

    /// Replaces the whole filter, including root paths.
    ///
    /// Always forces a full gather on the next query.
    pub fn update_filter(&mut self, filter: DirtyListFilter) {
        self.filter = filter;
        self.state = DirtyListState::Init;
    }

    // -- Introspection --

    /// Returns the active filter.
    #[must_use]
    pub fn filter(&self) -> &DirtyListFilter {
        &self.filter
    }

    /// Returns the cache state after the most recent query.
    #[must_use]
    pub fn state(&self) -> DirtyListState {
        self.state
    }

    /// Returns how the most recent query produced its result.
    #[must_use]
    pub fn last_outcome(&self) -> GatherOutcome {
        self.outcome
    }
}

fn full_gather<V, T>(
    filter: &DirtyListFilter,
    population: &BTreeMap<EntityPath, V>,
    tracker: &ChangeTracker,
    tag_of: &T,
) -> Vec<EntityPath>
where
    T: Fn(&V) -> &RenderTag,
{
    gather(population, filter, |path, value| {
        if !filter.matches_tag(tag_of(value)) {
            return false;
        }
        match tracker.entry(path) {
            Some((bits, _)) => filter.is_relevant(bits),
            None => {
                skipped(path, "not tracked");
                false
            }
        }
    })
}

fn varying_gather<V, T>(
    filter: &DirtyListFilter,
    population: &BTreeMap<EntityPath, V>,
    tracker: &ChangeTracker,
    tag_of: &T,
) -> Vec<EntityPath>
where
    T: Fn(&V) -> &RenderTag,
{
    gather(tracker.varying_set(), filter, |path, ()| {
        let Some(value) = population.get(path) else {
            skipped(path, "varying entity missing from population");
            return false;
        };
        // Kept whatever its current bits: a varying entry dropped here would
        // not come back until some version moved.
        filter.matches_tag(tag_of(value))
    })
}

fn skipped(path: &EntityPath, reason: &'static str) {
    log::warn!(
        "{}",
        SyncError::FilterGatherFailure {
            path: path.clone(),
            reason,
        }
    );
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::bits::DirtyBits;

    fn p(s: &str) -> EntityPath {
        EntityPath::new(s).unwrap()
    }

    /// Population plus tracker, mirroring what the render index owns.
    struct Scene {
        population: BTreeMap<EntityPath, RenderTag>,
        tracker: ChangeTracker,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                population: BTreeMap::new(),
                tracker: ChangeTracker::new(),
            }
        }

        fn insert(&mut self, path: &str, tag: &str) {
            self.population.insert(p(path), RenderTag::new(tag));
            self.tracker.insert_entity(p(path));
        }

        fn remove(&mut self, path: &str) {
            self.population.remove(&p(path));
            self.tracker.remove_entity(&p(path));
        }

        fn query(&self, list: &mut DirtyList) -> Vec<EntityPath> {
            list.refresh(&self.population, &self.tracker, |tag| tag)
                .to_vec()
        }

        /// Stand-in for a sync pass: clean everything in the worklist.
        fn sync(&mut self, worklist: &[EntityPath]) {
            for id in worklist {
                self.tracker.mark_entity_clean(id);
            }
        }

        fn clean_all(&mut self) {
            let ids: Vec<_> = self.population.keys().cloned().collect();
            self.sync(&ids);
        }

        fn mark_all(&mut self, bits: DirtyBits) {
            let ids: Vec<_> = self.population.keys().cloned().collect();
            for id in &ids {
                self.tracker.mark_entity_dirty(id, bits);
            }
        }
    }

    fn grouped_scene() -> Scene {
        let mut scene = Scene::new();
        for group in ["A", "B", "C", "E"] {
            for i in 0..2 {
                scene.insert(&alloc::format!("/{group}/e{i}"), "geometry");
            }
        }
        scene
    }

    fn roots(groups: &[&str]) -> DirtyListFilter {
        DirtyListFilter::with_roots(groups.iter().map(|g| p(g)).collect())
    }

    #[test]
    fn first_query_returns_inserted_population() {
        let mut scene = Scene::new();
        scene.insert("/b", "geometry");
        scene.insert("/a", "geometry");
        scene.insert("/c", "geometry");
        let mut list = DirtyList::default();

        let out = scene.query(&mut list);

        assert_eq!(out, [p("/a"), p("/b"), p("/c")]);
        assert_eq!(list.last_outcome(), GatherOutcome::Full);
        assert_eq!(list.state(), DirtyListState::Stable);
    }

    #[test]
    fn second_query_without_mutation_is_empty() {
        let mut scene = grouped_scene();
        let mut list = DirtyList::default();

        assert_eq!(scene.query(&mut list).len(), 8);
        assert!(scene.query(&mut list).is_empty());
        assert_eq!(list.state(), DirtyListState::Empty);
        assert_eq!(list.last_outcome(), GatherOutcome::Unchanged);

        // Also holds for an empty first result.
        scene.clean_all();
        scene.tracker.reset_varying_state();
        assert!(scene.query(&mut list).is_empty());
        assert!(scene.query(&mut list).is_empty());
        assert_eq!(list.state(), DirtyListState::Empty);
    }

    #[test]
    fn steady_state_entity_is_retained_while_clean() {
        let mut scene = Scene::new();
        scene.insert("/anim", "geometry");
        scene.insert("/still", "geometry");
        let mut list = DirtyList::default();
        let first = scene.query(&mut list);
        scene.sync(&first);
        scene.tracker.reset_varying_state();
        assert!(scene.query(&mut list).is_empty());

        for pass in 0..5 {
            scene
                .tracker
                .mark_entity_dirty(&p("/anim"), DirtyBits::POINTS);
            // The worklist is fixed once queried; cleaning happens after.
            let out = scene.query(&mut list);
            assert_eq!(out, [p("/anim")], "pass {pass}");
            scene.sync(&out);
            assert_eq!(
                scene.tracker.entity_dirty_bits(&p("/anim")),
                DirtyBits::CLEAN
            );
        }
        assert_eq!(list.last_outcome(), GatherOutcome::Reused);

        // Bits read clean, yet the entity stays in the steady-state cache.
        scene
            .tracker
            .mark_entity_dirty(&p("/still"), DirtyBits::CLEAN);
        assert_eq!(scene.query(&mut list), [p("/anim")]);
    }

    #[test]
    fn reset_varying_evicts_clean_entities() {
        let mut scene = Scene::new();
        scene.insert("/a", "geometry");
        scene.insert("/b", "geometry");
        let mut list = DirtyList::default();
        let out = scene.query(&mut list);
        scene.sync(&out);

        scene.tracker.mark_entity_dirty(&p("/a"), DirtyBits::TRANSFORM);
        assert_eq!(scene.query(&mut list), [p("/a"), p("/b")]);
        assert_eq!(list.last_outcome(), GatherOutcome::Varying);
        scene.clean_all();

        scene.tracker.mark_entity_dirty(&p("/b"), DirtyBits::POINTS);
        scene.tracker.reset_varying_state();

        assert_eq!(scene.query(&mut list), [p("/b")]);
        assert_eq!(list.last_outcome(), GatherOutcome::Varying);
        assert!(!scene.tracker.is_varying(&p("/a")));
    }

    #[test]
    fn structural_changes_force_full_gather() {
        let mut scene = grouped_scene();
        let mut list = DirtyList::default();
        let out = scene.query(&mut list);
        scene.sync(&out);

        // Insert.
        scene.insert("/F/e0", "geometry");
        assert_eq!(scene.query(&mut list), [p("/F/e0")]);
        assert_eq!(list.last_outcome(), GatherOutcome::Full);
        scene.clean_all();

        // Remove.
        scene.tracker.mark_entity_dirty(&p("/A/e0"), DirtyBits::POINTS);
        scene.remove("/F/e0");
        assert_eq!(scene.query(&mut list), [p("/A/e0")]);
        assert_eq!(list.last_outcome(), GatherOutcome::Full);
        scene.clean_all();

        // Structural bit.
        scene
            .tracker
            .mark_entity_dirty(&p("/B/e1"), DirtyBits::RENDER_TAG);
        assert_eq!(scene.query(&mut list), [p("/B/e1")]);
        assert_eq!(list.last_outcome(), GatherOutcome::Full);
        scene.clean_all();

        // Criteria update with no scene mutation at all.
        list.update_tracked_criteria(vec![RenderTag::new("guide")], Vec::new());
        assert_eq!(list.state(), DirtyListState::Init);
        assert!(scene.query(&mut list).is_empty());
        assert_eq!(list.last_outcome(), GatherOutcome::Full);
    }

    #[test]
    fn full_gather_reflects_current_filter() {
        let mut scene = Scene::new();
        scene.insert("/a", "geometry");
        scene.insert("/g", "guide");
        let mut list = DirtyList::new(DirtyListFilter {
            render_tags: vec![RenderTag::geometry()],
            ..DirtyListFilter::default()
        });
        assert_eq!(scene.query(&mut list), [p("/a")]);

        list.update_tracked_criteria(vec![RenderTag::new("guide")], Vec::new());
        assert_eq!(scene.query(&mut list), [p("/g")]);

        list.update_tracked_criteria(
            vec![RenderTag::geometry(), RenderTag::new("guide")],
            Vec::new(),
        );
        assert_eq!(scene.query(&mut list), [p("/a"), p("/g")]);
    }

    #[test]
    fn selectors_filter_by_relevant_bits() {
        let mut scene = Scene::new();
        scene.insert("/a", "geometry");
        scene.insert("/b", "geometry");
        scene.clean_all();
        scene.tracker.mark_entity_dirty(&p("/a"), DirtyBits::POINTS);
        scene
            .tracker
            .mark_entity_dirty(&p("/b"), DirtyBits::TRANSFORM);

        let mut list = DirtyList::new(DirtyListFilter {
            repr_selectors: vec![ReprSelector::bounds()],
            ..DirtyListFilter::default()
        });
        assert_eq!(scene.query(&mut list), [p("/b")]);

        list.update_tracked_criteria(Vec::new(), vec![ReprSelector::new("bogus", DirtyBits::CLEAN)]);
        assert!(scene.query(&mut list).is_empty());
    }

    #[test]
    fn varying_entity_dirty_in_ignored_fields_stays_listed() {
        let mut scene = Scene::new();
        scene.insert("/a", "geometry");
        scene.insert("/b", "geometry");
        let mut list = DirtyList::new(DirtyListFilter {
            repr_selectors: vec![ReprSelector::bounds()],
            ..DirtyListFilter::default()
        });
        let first = scene.query(&mut list);
        assert_eq!(first, [p("/a"), p("/b")]);
        scene.sync(&first);

        // Points are outside the bounds representation.
        scene.tracker.mark_entity_dirty(&p("/a"), DirtyBits::POINTS);
        let second = scene.query(&mut list);
        assert_eq!(list.last_outcome(), GatherOutcome::Varying);
        assert_eq!(second, [p("/a"), p("/b")]);

        // Only the worklist is cleaned, as a sync pass would.
        scene.tracker.mark_entity_clean(&p("/b"));
        scene
            .tracker
            .mark_entity_dirty(&p("/a"), DirtyBits::TRANSFORM);
        let third = scene.query(&mut list);
        assert_eq!(list.last_outcome(), GatherOutcome::Reused);
        assert!(third.contains(&p("/a")));
        assert!(
            scene
                .tracker
                .entity_dirty_bits(&p("/a"))
                .contains(DirtyBits::TRANSFORM)
        );
    }

    #[test]
    fn grouped_scenario() {
        let mut scene = grouped_scene();
        let mut list = DirtyList::default();
        assert_eq!(scene.query(&mut list).len(), 8);

        scene.clean_all();
        list.update_filter(roots(&["/A"]));
        assert_eq!(scene.query(&mut list).len(), 0);

        scene.tracker.reset_varying_state();
        scene.mark_all(DirtyBits::POINTS);
        list.update_filter(roots(&["/A", "/B"]));
        let out = scene.query(&mut list);
        assert_eq!(out.len(), 4);
        assert!(
            out.iter()
                .all(|id| id.has_prefix(&p("/A")) || id.has_prefix(&p("/B")))
        );
    }

    #[test]
    fn narrowing_and_widening_reshape_unsynchronized_result() {
        let scene = grouped_scene();
        let mut list = DirtyList::default();
        assert_eq!(scene.query(&mut list).len(), 8);

        list.update_filter(roots(&["/A"]));
        assert_eq!(scene.query(&mut list), [p("/A/e0"), p("/A/e1")]);

        list.update_filter(DirtyListFilter::default());
        assert_eq!(scene.query(&mut list).len(), 8);
    }

    #[test]
    fn excluded_subtree_is_skipped() {
        let scene = grouped_scene();
        let mut list = DirtyList::new(DirtyListFilter {
            exclude_paths: vec![p("/C"), p("/E")],
            ..DirtyListFilter::default()
        });
        assert_eq!(scene.query(&mut list).len(), 4);
    }

    #[test]
    fn untracked_population_entry_is_skipped() {
        let mut scene = Scene::new();
        scene.insert("/a", "geometry");
        scene
            .population
            .insert(p("/orphan"), RenderTag::geometry());
        let mut list = DirtyList::default();

        assert_eq!(scene.query(&mut list), [p("/a")]);
    }
}
