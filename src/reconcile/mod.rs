//! Reconcile module.
//!
//! This module contains the engine that aligns two store trees,
//! classifies their differences and restores missing content from
//! one side into the other.

use serde::Serialize;
use std::result;
use thiserror::Error;

use crate::{store, FolderPath};

pub mod compare;
pub use compare::{CompareBuilder, ComparisonKind, ComparisonNode, ComparisonReport};

pub mod signature;
pub use signature::{ItemSignature, MetadataSignature, SignatureIndex};

pub mod restore;
pub use restore::{RestoreBuilder, RestoreOutcome, RestoreRecord, RestoreReport};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot list folders under {1} in store {2}")]
    ListFoldersError(#[source] store::Error, FolderPath, String),
    #[error("cannot enumerate items of folder {1} in store {2}")]
    ListItemsError(#[source] store::Error, FolderPath, String),
    #[error("cannot build signature index for folder {1}")]
    BuildSignatureIndexError(#[source] store::Error, FolderPath),

    #[error(transparent)]
    StoreError(#[from] store::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the milestones reported to the progress callback of
/// the compare and restore builders.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReconcileProgressEvent {
    CompareFolder(FolderPath),
    CheckFolder(FolderPath),
    BuildSignatureIndex(FolderPath),
    RestoreFolder(FolderPath),
    RestoreItems(FolderPath, usize),
}

/// Represents the per-run accumulators of a comparison. They live
/// for one invocation: zeroed when the traversal starts, read once
/// when the report is rendered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RunCounters {
    pub matched: usize,
    pub count_differs: usize,
    pub absent_in_target: usize,
    pub absent_in_target_items: usize,
    pub absent_in_source: usize,
    pub absent_in_source_items: usize,
    pub truncated: usize,
    pub errors: usize,
}

impl RunCounters {
    /// Returns the total number of folder pairs and absent-only
    /// folders visited by the traversal.
    pub fn folders_visited(&self) -> usize {
        self.matched
            + self.count_differs
            + self.absent_in_target
            + self.absent_in_source
            + self.truncated
            + self.errors
    }
}
