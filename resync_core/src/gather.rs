// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical filter-and-collect.
//!
//! [`gather`] walks every subtree named by a filter's include roots, skips the
//! subtrees named by its exclude roots, and keeps the paths a predicate
//! accepts. Because [`EntityPath`] orders component by component, each
//! subtree is a contiguous range of an ordered collection, so a walk costs
//! O(log n) to find the root plus the size of the subtree.
//!
//! The result is sorted and duplicate-free: nested include roots are folded
//! into their ancestors before the walk, and distinct top-level roots cover
//! disjoint ranges that are visited in order.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::filter::DirtyListFilter;
use crate::path::EntityPath;

/// An ordered collection keyed by [`EntityPath`].
pub trait PathSource {
    /// Value stored alongside each path.
    type Item;

    /// Iterates entries with paths `>= start`, in path order.
    fn range_from<'a>(
        &'a self,
        start: &EntityPath,
    ) -> impl Iterator<Item = (&'a EntityPath, &'a Self::Item)>;
}

impl<V> PathSource for BTreeMap<EntityPath, V> {
    type Item = V;

    fn range_from<'a>(
        &'a self,
        start: &EntityPath,
    ) -> impl Iterator<Item = (&'a EntityPath, &'a V)> {
        self.range(start.clone()..)
    }
}

impl PathSource for BTreeSet<EntityPath> {
    type Item = ();

    fn range_from<'a>(
        &'a self,
        start: &EntityPath,
    ) -> impl Iterator<Item = (&'a EntityPath, &'a ())> {
        self.range(start.clone()..).map(|path| (path, &()))
    }
}

/// Collects the paths of `source` inside the filter's roots that `keep`
/// accepts.
///
/// Tags and selectors are not consulted here; `keep` decides membership.
pub fn gather<S, F>(source: &S, filter: &DirtyListFilter, mut keep: F) -> Vec<EntityPath>
where
    S: PathSource + ?Sized,
    F: FnMut(&EntityPath, &S::Item) -> bool,
{
    let roots = normalize_roots(&filter.include_paths);
    let excludes = &filter.exclude_paths;
    let mut out = Vec::new();

    for root in &roots {
        for (path, item) in source.range_from(root) {
            if !path.has_prefix(root) {
                break;
            }
            if excludes.iter().any(|ex| path.has_prefix(ex)) {
                continue;
            }
            if keep(path, item) {
                out.push(path.clone());
            }
        }
    }

    debug_assert!(out.windows(2).all(|w| w[0] < w[1]), "gather must be sorted");
    out
}

/// Sorts roots and drops any root nested inside another.
fn normalize_roots(roots: &[EntityPath]) -> Vec<EntityPath> {
    let mut sorted: Vec<_> = roots.to_vec();
    sorted.sort_unstable();
    let mut out: Vec<EntityPath> = Vec::with_capacity(sorted.len());
    for root in sorted {
        // Sorted order puts an ancestor directly before its subtree.
        if out.last().is_some_and(|kept| root.has_prefix(kept)) {
            continue;
        }
        out.push(root);
    }
    out
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn p(s: &str) -> EntityPath {
        EntityPath::new(s).unwrap()
    }

    fn population(paths: &[&str]) -> BTreeMap<EntityPath, u32> {
        paths.iter().zip(0_u32..).map(|(s, i)| (p(s), i)).collect()
    }

    fn strs(paths: &[EntityPath]) -> Vec<&str> {
        paths.iter().map(EntityPath::as_str).collect()
    }

    #[test]
    fn root_filter_keeps_everything_in_order() {
        let pop = population(&["/B/x", "/A/y", "/A/x", "/C"]);
        let out = gather(&pop, &DirtyListFilter::default(), |_, _| true);
        assert_eq!(strs(&out), ["/A/x", "/A/y", "/B/x", "/C"]);
    }

    #[test]
    fn include_root_respects_component_boundary() {
        let pop = population(&["/A", "/A/x", "/AB/x", "/A-b", "/B"]);
        let filter = DirtyListFilter::with_roots(vec![p("/A")]);
        let out = gather(&pop, &filter, |_, _| true);
        assert_eq!(strs(&out), ["/A", "/A/x"]);
    }

    #[test]
    fn nested_roots_do_not_duplicate() {
        let pop = population(&["/A/x", "/A/x/y", "/B"]);
        let filter = DirtyListFilter::with_roots(vec![p("/A/x"), p("/A"), p("/A")]);
        let out = gather(&pop, &filter, |_, _| true);
        assert_eq!(strs(&out), ["/A/x", "/A/x/y"]);
    }

    #[test]
    fn exclude_roots_prune_subtrees() {
        let pop = population(&["/A/x", "/A/y", "/A/y/z", "/B"]);
        let filter = DirtyListFilter {
            exclude_paths: vec![p("/A/y")],
            ..DirtyListFilter::default()
        };
        let out = gather(&pop, &filter, |_, _| true);
        assert_eq!(strs(&out), ["/A/x", "/B"]);
    }

    #[test]
    fn predicate_sees_values() {
        let pop = population(&["/a", "/b", "/c", "/d"]);
        let out = gather(&pop, &DirtyListFilter::default(), |_, v| v % 2 == 0);
        assert_eq!(strs(&out), ["/a", "/c"]);
    }

    #[test]
    fn sets_are_sources() {
        let set: BTreeSet<_> = ["/A/x", "/B/y", "/C"].into_iter().map(p).collect();
        let filter = DirtyListFilter::with_roots(vec![p("/C"), p("/A")]);
        let out = gather(&set, &filter, |_, ()| true);
        assert_eq!(strs(&out), ["/A/x", "/C"]);
    }

    #[test]
    fn no_roots_gathers_nothing() {
        let pop = population(&["/A"]);
        let filter = DirtyListFilter::with_roots(Vec::new());
        assert!(gather(&pop, &filter, |_, _| true).is_empty());
    }
}
