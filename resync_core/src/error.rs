// Copyright 2026 the Resync Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Nothing in this crate is fatal to a synchronization pass. Unknown entity
//! references and gather failures are logged and degrade to no-ops; a
//! dependency cycle fails only the computation batch that contains it.

use alloc::string::String;

use thiserror::Error;

use crate::index::DelegateId;
use crate::path::EntityPath;

/// Errors surfaced by the change tracker, render index and sync pass.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A mark, query or removal named an entity the index does not hold.
    #[error("unknown entity reference `{0}`")]
    UnknownEntityReference(EntityPath),
    /// A gather skipped an entity it could not evaluate.
    ///
    /// The entity contributes nothing to the result; the pass continues.
    #[error("gather skipped `{path}`: {reason}")]
    FilterGatherFailure {
        /// Entity that was skipped.
        path: EntityPath,
        /// Why it was skipped.
        reason: &'static str,
    },
    /// A computation batch could not be ordered.
    #[error(transparent)]
    DependencyCycle(#[from] DependencyCycle),
    /// An operation named a delegate that is not registered.
    #[error("unknown scene delegate {0:?}")]
    UnknownDelegate(DelegateId),
}

/// A dependency edge that would close a cycle.
///
/// `dependent` was declared to depend on `dependency`, but `dependency`
/// already (transitively) depends on `dependent`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("dependency cycle: `{dependent}` -> `{dependency}`")]
pub struct DependencyCycle {
    /// The computation whose dependency closed the cycle.
    pub dependent: EntityPath,
    /// The dependency that closed it.
    pub dependency: EntityPath,
}

/// Reasons an [`EntityPath`] failed to parse.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    /// The input was empty.
    #[error("path is empty")]
    Empty,
    /// The input did not start with `/`.
    #[error("path `{0}` is not absolute")]
    NotAbsolute(String),
    /// The input contained an empty component (`//` or a trailing `/`).
    #[error("path `{0}` contains an empty component")]
    EmptyComponent(String),
    /// A component contained a character outside the allowed set.
    #[error("invalid character {0:?} in path component")]
    InvalidCharacter(char),
}
