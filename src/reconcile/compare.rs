//! Compare module.
//!
//! This module contains the tree aligner: it walks two store trees
//! in lock-step by folder name and classifies every folder pair it
//! visits. The walk is read-only, depth-first and sequential.

use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::{config, Folder, Store};

use super::{Error, ReconcileProgressEvent, Result, RunCounters};

/// Represents the classification of one folder pair.
///
/// The classification is a pure function of the two item counts and
/// of the presence of each side. It never depends on the order the
/// backends enumerate folders in.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum ComparisonKind {
    /// Present on both sides, item counts equal.
    Matched,
    /// Present on both sides, item counts differ.
    CountDiffers,
    /// Present in the source only. The whole subtree is absent, so
    /// it is classified once and never descended into.
    AbsentInTarget,
    /// Present in the target only. Same shortcut as above.
    AbsentInSource,
    /// The traversal depth bound was reached, the pair was not
    /// classified and its subtree not visited.
    DepthExceeded,
    /// The pair could not be compared. Siblings are unaffected.
    Failed(String),
}

impl ComparisonKind {
    /// Classifies a folder pair known to exist on both sides.
    pub fn classify(source_count: usize, target_count: usize) -> Self {
        if source_count == target_count {
            Self::Matched
        } else {
            Self::CountDiffers
        }
    }
}

/// Represents the outcome of aligning one folder pair, with the
/// outcomes of the children below it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ComparisonNode {
    pub name: String,
    pub kind: ComparisonKind,
    pub source_count: usize,
    pub target_count: usize,
    pub children: Vec<ComparisonNode>,
}

impl ComparisonNode {
    fn leaf(name: String, kind: ComparisonKind, source_count: usize, target_count: usize) -> Self {
        Self {
            name,
            kind,
            source_count,
            target_count,
            children: Vec::new(),
        }
    }
}

/// Represents the result of one comparison run: the aligned tree
/// and the accumulated counters.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub root: ComparisonNode,
    pub counters: RunCounters,
}

/// The comparison run builder.
pub struct CompareBuilder<'a> {
    max_depth: usize,
    on_progress: Box<dyn Fn(ReconcileProgressEvent) + 'a>,
}

impl<'a> Default for CompareBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CompareBuilder<'a> {
    pub fn new() -> Self {
        Self {
            max_depth: config::DEFAULT_MAX_DEPTH,
            on_progress: Box::new(|_| ()),
        }
    }

    pub fn from_config(config: &config::ReconcileConfig) -> Self {
        Self::new().max_depth(config.max_depth)
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(ReconcileProgressEvent) + 'a,
    {
        self.on_progress = Box::new(f);
        self
    }

    /// Compares the two store trees and returns the aligned tree
    /// with the run counters.
    ///
    /// Only opening the roots can fail the run. Anything going
    /// wrong below the roots degrades into a [`ComparisonKind::Failed`]
    /// node and the traversal carries on with the next sibling.
    pub fn compare(&self, source: &dyn Store, target: &dyn Store) -> Result<ComparisonReport> {
        info!(
            "comparing store {} against store {}",
            source.name(),
            target.name()
        );

        let source_root = source.root()?;
        let target_root = target.root()?;

        let mut counters = RunCounters::default();
        let root = match self.align_pair(source, target, &source_root, &target_root, 0, &mut counters)
        {
            Ok(node) => node,
            Err(err) => {
                error!("cannot compare store roots: {}", err);
                counters.errors += 1;
                ComparisonNode::leaf(source_root.name, ComparisonKind::Failed(err.to_string()), 0, 0)
            }
        };

        info!("comparison done, {} folders visited", counters.folders_visited());
        Ok(ComparisonReport { root, counters })
    }

    fn align_pair(
        &self,
        source: &dyn Store,
        target: &dyn Store,
        source_folder: &Folder,
        target_folder: &Folder,
        depth: usize,
        counters: &mut RunCounters,
    ) -> Result<ComparisonNode> {
        (self.on_progress)(ReconcileProgressEvent::CompareFolder(
            source_folder.path.clone(),
        ));
        debug!("comparing folder pair {}", source_folder.path);

        let source_count = source.count_items_or_zero(source_folder);
        let target_count = target.count_items_or_zero(target_folder);

        let kind = ComparisonKind::classify(source_count, target_count);

        let source_children = source.list_folders(source_folder).map_err(|err| {
            Error::ListFoldersError(err, source_folder.path.clone(), source.name().to_owned())
        })?;
        let target_children = target.list_folders(target_folder).map_err(|err| {
            Error::ListFoldersError(err, target_folder.path.clone(), target.name().to_owned())
        })?;

        // Tallied only once both listings succeeded: a pair that
        // degrades into an error node counts as an error, not as a
        // classification.
        match kind {
            ComparisonKind::Matched => counters.matched += 1,
            _ => counters.count_differs += 1,
        }

        let target_by_name: HashMap<&str, &Folder> = target_children
            .iter()
            .map(|folder| (folder.name.as_str(), folder))
            .collect();
        let mut consumed: HashSet<&str> = HashSet::new();

        let mut children = Vec::new();

        // Source-aligned children first, in source enumeration
        // order.
        for child in &source_children {
            match target_by_name.get(child.name.as_str()) {
                Some(target_child) => {
                    consumed.insert(child.name.as_str());

                    if depth + 1 > self.max_depth {
                        warn!(
                            "traversal depth bound {} reached at {}, not descending",
                            self.max_depth, child.path
                        );
                        counters.truncated += 1;
                        children.push(ComparisonNode::leaf(
                            child.name.clone(),
                            ComparisonKind::DepthExceeded,
                            source.count_items_or_zero(child),
                            target.count_items_or_zero(target_child),
                        ));
                        continue;
                    }

                    let node = match self.align_pair(
                        source,
                        target,
                        child,
                        target_child,
                        depth + 1,
                        counters,
                    ) {
                        Ok(node) => node,
                        Err(err) => {
                            warn!("cannot compare folder {}, skipping: {}", child.path, err);
                            counters.errors += 1;
                            ComparisonNode::leaf(
                                child.name.clone(),
                                ComparisonKind::Failed(err.to_string()),
                                0,
                                0,
                            )
                        }
                    };
                    children.push(node);
                }
                None => {
                    let items = source.count_items_or_zero(child);
                    counters.absent_in_target += 1;
                    counters.absent_in_target_items += items;
                    children.push(ComparisonNode::leaf(
                        child.name.clone(),
                        ComparisonKind::AbsentInTarget,
                        items,
                        0,
                    ));
                }
            }
        }

        // Remaining target-only children, in target enumeration
        // order.
        for child in &target_children {
            if consumed.contains(child.name.as_str()) {
                continue;
            }
            let items = target.count_items_or_zero(child);
            counters.absent_in_source += 1;
            counters.absent_in_source_items += items;
            children.push(ComparisonNode::leaf(
                child.name.clone(),
                ComparisonKind::AbsentInSource,
                0,
                items,
            ));
        }

        Ok(ComparisonNode {
            name: source_folder.name.clone(),
            kind,
            source_count,
            target_count,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ComparisonKind;

    #[test]
    fn classify_by_counts() {
        assert_eq!(ComparisonKind::Matched, ComparisonKind::classify(0, 0));
        assert_eq!(ComparisonKind::Matched, ComparisonKind::classify(10, 10));
        assert_eq!(ComparisonKind::CountDiffers, ComparisonKind::classify(12, 9));
        assert_eq!(ComparisonKind::CountDiffers, ComparisonKind::classify(0, 3));
    }
}
