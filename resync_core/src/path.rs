// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical entity identifiers.
//!
//! An [`EntityPath`] names an entity (or auxiliary object) by its position in
//! the scene hierarchy, e.g. `/World/Props/chair_0`. Paths are totally ordered
//! component by component, which makes every subtree a contiguous range in an
//! ordered map: `/A`, `/A/x` and `/A/x/y` sort together and before `/A-b`.
//! The [`gather`](crate::gather) traversal depends on this property.

use alloc::string::String;
use alloc::sync::Arc;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::error::PathError;

/// A validated, absolute, `/`-separated scene path.
///
/// Cloning is cheap (reference counted), so paths are passed around by value
/// in worklists.
#[derive(Clone)]
pub struct EntityPath(Arc<str>);

impl EntityPath {
    /// Parses and validates a path.
    ///
    /// Paths must start with `/`, must not end with `/` (except the root
    /// itself) and every component must be a non-empty run of ASCII
    /// alphanumerics, `_`, `-`, `.` or `:`.
    pub fn new(path: &str) -> Result<Self, PathError> {
        validate(path)?;
        Ok(Self(Arc::from(path)))
    }

    /// Returns the absolute root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self(Arc::from("/"))
    }

    /// Returns whether this is the root path.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        &*self.0 == "/"
    }

    /// Returns the path as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends a single component.
    pub fn child(&self, name: &str) -> Result<Self, PathError> {
        validate_component(name)?;
        let mut s = String::with_capacity(self.0.len() + name.len() + 1);
        s.push_str(&self.0);
        if !self.is_root() {
            s.push('/');
        }
        s.push_str(name);
        Ok(Self(Arc::from(s)))
    }

    /// Returns the parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(i) => Some(Self(Arc::from(&self.0[..i]))),
            None => None,
        }
    }

    /// Returns the last component, or `""` for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Iterates the components from the root down.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Returns `true` if `prefix` is this path or one of its ancestors.
    ///
    /// The root is a prefix of every path. `/A` is a prefix of `/A/b` but not
    /// of `/AB`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &Self) -> bool {
        if prefix.is_root() {
            return true;
        }
        let (s, p) = (self.0.as_bytes(), prefix.0.as_bytes());
        s.starts_with(p) && (s.len() == p.len() || s[p.len()] == b'/')
    }

    /// Byte sequence with separators ranked below every component character.
    fn order_key(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| if b == b'/' { 0 } else { b })
    }
}

fn validate(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PathError::NotAbsolute(String::from(path)));
    };
    if rest.is_empty() {
        return Ok(());
    }
    for component in rest.split('/') {
        validate_component(component).map_err(|err| match err {
            PathError::EmptyComponent(_) => PathError::EmptyComponent(String::from(path)),
            other => other,
        })?;
    }
    Ok(())
}

fn validate_component(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        return Err(PathError::EmptyComponent(String::from(name)));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
    {
        return Err(PathError::InvalidCharacter(c));
    }
    Ok(())
}

impl PartialEq for EntityPath {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for EntityPath {}

impl Hash for EntityPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for EntityPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(other.order_key())
    }
}

impl fmt::Debug for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityPath({})", self.0)
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for EntityPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeSet;
    use alloc::vec::Vec;

    use super::*;

    fn p(s: &str) -> EntityPath {
        EntityPath::new(s).unwrap()
    }

    #[test]
    fn parses_valid_paths() {
        assert!(EntityPath::new("/").unwrap().is_root());
        assert_eq!(p("/World/chair_0").as_str(), "/World/chair_0");
        assert_eq!(p("/a.b/c:d/e-f").name(), "e-f");
    }

    #[test]
    fn rejects_invalid_paths() {
        assert_eq!(EntityPath::new(""), Err(PathError::Empty));
        assert!(matches!(
            EntityPath::new("World"),
            Err(PathError::NotAbsolute(_))
        ));
        assert!(matches!(
            EntityPath::new("/World/"),
            Err(PathError::EmptyComponent(_))
        ));
        assert!(matches!(
            EntityPath::new("/a//b"),
            Err(PathError::EmptyComponent(_))
        ));
        assert_eq!(
            EntityPath::new("/a b"),
            Err(PathError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn child_and_parent_round_trip() {
        let root = EntityPath::root();
        let a = root.child("A").unwrap();
        let b = a.child("b").unwrap();
        assert_eq!(a, p("/A"));
        assert_eq!(b, p("/A/b"));
        assert_eq!(b.parent(), Some(a.clone()));
        assert_eq!(a.parent(), Some(root.clone()));
        assert_eq!(root.parent(), None);
        assert!(a.child("x/y").is_err());
    }

    #[test]
    fn components_skip_separators() {
        let chair = p("/World/Props/chair");
        let parts: Vec<_> = chair.components().collect();
        assert_eq!(parts, ["World", "Props", "chair"]);
        assert_eq!(EntityPath::root().components().count(), 0);
    }

    #[test]
    fn prefix_respects_component_boundaries() {
        assert!(p("/A/b").has_prefix(&p("/A")));
        assert!(p("/A").has_prefix(&p("/A")));
        assert!(p("/A").has_prefix(&EntityPath::root()));
        assert!(!p("/AB").has_prefix(&p("/A")));
        assert!(!p("/A").has_prefix(&p("/A/b")));
    }

    #[test]
    fn subtrees_are_contiguous_in_order() {
        let set: BTreeSet<_> = ["/A-b", "/A/x", "/A", "/A/x/y", "/B", "/A.c"]
            .into_iter()
            .map(p)
            .collect();
        let ordered: Vec<_> = set.iter().map(EntityPath::as_str).collect();
        assert_eq!(ordered, ["/A", "/A/x", "/A/x/y", "/A-b", "/A.c", "/B"]);
    }
}
