// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-list filter criteria.
//!
//! A [`DirtyListFilter`] selects the entities one render pass cares about:
//!
//! - **Render tags**: an entity matches if its tag is any of the tracked
//!   tags. An empty tag list matches every tag.
//! - **Representation selectors**: each selector names the dirty fields its
//!   representation consumes. An entity's dirty bits must intersect the union
//!   of the tracked selectors' masks. An empty selector list treats every
//!   field as relevant.
//! - **Root paths**: only entities at or below an include root, and not at
//!   or below an exclude root, are considered.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::bits::DirtyBits;
use crate::path::EntityPath;

/// Classification token selecting subsets of entities for a pass.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderTag(Arc<str>);

impl RenderTag {
    /// Creates a tag from its name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// The default tag for ordinary scene geometry.
    #[must_use]
    pub fn geometry() -> Self {
        Self::new("geometry")
    }

    /// Returns the tag name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RenderTag {
    fn default() -> Self {
        Self::geometry()
    }
}

impl fmt::Debug for RenderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderTag({})", self.0)
    }
}

impl fmt::Display for RenderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names a visual representation and the dirty fields it consumes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReprSelector {
    name: Arc<str>,
    relevant: DirtyBits,
}

impl ReprSelector {
    /// Creates a selector consuming the given fields.
    #[must_use]
    pub fn new(name: &str, relevant: DirtyBits) -> Self {
        Self {
            name: Arc::from(name),
            relevant,
        }
    }

    /// Full-detail representation; every field matters.
    #[must_use]
    pub fn refined() -> Self {
        Self::new("refined", DirtyBits::ALL_DIRTY)
    }

    /// Bounding-box representation; only placement and bounds matter.
    #[must_use]
    pub fn bounds() -> Self {
        Self::new(
            "bounds",
            DirtyBits::STRUCTURAL
                | DirtyBits::TRANSFORM
                | DirtyBits::EXTENT
                | DirtyBits::VISIBILITY,
        )
    }

    /// Returns the selector name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fields this representation consumes.
    #[must_use]
    pub const fn relevant_bits(&self) -> DirtyBits {
        self.relevant
    }
}

/// The criteria a [`DirtyList`](crate::dirty_list::DirtyList) filters by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirtyListFilter {
    /// Tracked render tags, OR-combined. Empty matches every tag.
    pub render_tags: Vec<RenderTag>,
    /// Tracked representation selectors, OR-combined. Empty makes every
    /// dirty field relevant.
    pub repr_selectors: Vec<ReprSelector>,
    /// Subtrees to consider.
    pub include_paths: Vec<EntityPath>,
    /// Subtrees to skip, even below an include root.
    pub exclude_paths: Vec<EntityPath>,
}

impl Default for DirtyListFilter {
    fn default() -> Self {
        Self {
            render_tags: Vec::new(),
            repr_selectors: Vec::new(),
            include_paths: vec![EntityPath::root()],
            exclude_paths: Vec::new(),
        }
    }
}

impl DirtyListFilter {
    /// Creates a filter that tracks everything below the given roots.
    #[must_use]
    pub fn with_roots(include_paths: Vec<EntityPath>) -> Self {
        Self {
            include_paths,
            ..Self::default()
        }
    }

    /// Returns `true` if `tag` is tracked.
    #[must_use]
    pub fn matches_tag(&self, tag: &RenderTag) -> bool {
        self.render_tags.is_empty() || self.render_tags.contains(tag)
    }

    /// Returns the union of the fields the tracked selectors consume.
    #[must_use]
    pub fn relevant_bits(&self) -> DirtyBits {
        if self.repr_selectors.is_empty() {
            return DirtyBits::ALL_DIRTY;
        }
        self.repr_selectors
            .iter()
            .fold(DirtyBits::CLEAN, |acc, s| acc | s.relevant_bits())
    }

    /// Returns `true` if `bits` contains a field this filter cares about.
    #[must_use]
    pub fn is_relevant(&self, bits: DirtyBits) -> bool {
        bits.intersects(self.relevant_bits())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn empty_tag_list_matches_everything() {
        let filter = DirtyListFilter::default();
        assert!(filter.matches_tag(&RenderTag::geometry()));
        assert!(filter.matches_tag(&RenderTag::new("guide")));
    }

    #[test]
    fn tags_are_or_combined() {
        let filter = DirtyListFilter {
            render_tags: vec![RenderTag::geometry(), RenderTag::new("guide")],
            ..DirtyListFilter::default()
        };
        assert!(filter.matches_tag(&RenderTag::new("guide")));
        assert!(!filter.matches_tag(&RenderTag::new("proxy")));
    }

    #[test]
    fn selectors_union_their_masks() {
        let filter = DirtyListFilter {
            repr_selectors: vec![
                ReprSelector::new("points", DirtyBits::POINTS),
                ReprSelector::new("xform", DirtyBits::TRANSFORM),
            ],
            ..DirtyListFilter::default()
        };
        assert_eq!(
            filter.relevant_bits(),
            DirtyBits::POINTS | DirtyBits::TRANSFORM
        );
        assert!(filter.is_relevant(DirtyBits::TRANSFORM | DirtyBits::PRIMVAR));
        assert!(!filter.is_relevant(DirtyBits::PRIMVAR));
    }

    #[test]
    fn unknown_selector_contributes_nothing() {
        let filter = DirtyListFilter {
            repr_selectors: vec![ReprSelector::new("unknown", DirtyBits::CLEAN)],
            ..DirtyListFilter::default()
        };
        assert!(!filter.is_relevant(DirtyBits::ALL_DIRTY));
    }

    #[test]
    fn bounds_repr_ignores_geometry() {
        let bounds = ReprSelector::bounds();
        assert!(!bounds.relevant_bits().contains(DirtyBits::POINTS));
        assert!(bounds.relevant_bits().contains(DirtyBits::TRANSFORM));
    }
}
