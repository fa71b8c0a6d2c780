//! Restore module.
//!
//! This module contains the restore engine. It walks the source and
//! target trees the same way the aligner does, but instead of
//! classifying it acts: folders absent from the target are copied
//! whole, folders present on both sides are reconciled item by item
//! behind the signature index. Re-running a restore against an
//! already restored pair copies nothing.

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    config,
    store::{copy, RetryPolicy},
    Folder, FolderPath, Store,
};

use super::{
    Error, ItemSignature, MetadataSignature, ReconcileProgressEvent, Result, SignatureIndex,
};

/// Represents the outcome of one restore action.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum RestoreOutcome {
    /// The folder was absent in the target and copied whole,
    /// descendants included.
    RestoredFolder { items: usize },
    /// The folder existed on both sides, missing items were copied
    /// and duplicates skipped.
    RestoredItems { copied: usize, skipped: usize },
    /// The folder needed no action.
    Checked,
    /// The action failed and was skipped.
    Failed { reason: String },
}

/// Represents one line of the restore log.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RestoreRecord {
    pub folder: FolderPath,
    pub outcome: RestoreOutcome,
}

/// Represents the result of one restore run: the flat action log
/// and the run totals.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RestoreReport {
    /// True when the run only simulated its actions.
    pub dry_run: bool,
    pub records: Vec<RestoreRecord>,
    pub folders_restored: usize,
    pub items_restored: usize,
    pub duplicates_skipped: usize,
    pub folders_checked: usize,
    pub truncated: usize,
    pub errors: usize,
}

impl RestoreReport {
    fn record(&mut self, folder: &FolderPath, outcome: RestoreOutcome) {
        self.records.push(RestoreRecord {
            folder: folder.clone(),
            outcome,
        });
    }

    fn record_failure(&mut self, folder: &FolderPath, reason: String) {
        warn!("restore action failed for folder {}: {}", folder, reason);
        self.errors += 1;
        self.record(folder, RestoreOutcome::Failed { reason });
    }
}

/// The restore run builder.
pub struct RestoreBuilder<'a> {
    dry_run: bool,
    max_depth: usize,
    retry: RetryPolicy,
    signature: Box<dyn ItemSignature + 'a>,
    on_progress: Box<dyn Fn(ReconcileProgressEvent) + 'a>,
}

impl<'a> Default for RestoreBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RestoreBuilder<'a> {
    pub fn new() -> Self {
        Self {
            dry_run: false,
            max_depth: config::DEFAULT_MAX_DEPTH,
            retry: RetryPolicy::default(),
            signature: Box::new(MetadataSignature),
            on_progress: Box::new(|_| ()),
        }
    }

    pub fn from_config(config: &config::ReconcileConfig) -> Self {
        Self::new().max_depth(config.max_depth).retry(config.retry)
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn signature<S>(mut self, signature: S) -> Self
    where
        S: ItemSignature + 'a,
    {
        self.signature = Box::new(signature);
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(ReconcileProgressEvent) + 'a,
    {
        self.on_progress = Box::new(f);
        self
    }

    /// Restores into the target store everything found in the
    /// source store and absent from the target.
    ///
    /// Only opening the roots can fail the run. Every action below
    /// them commits independently: a failed copy is logged and the
    /// engine moves on to the next sibling or item, so an
    /// interrupted run leaves the target partially restored but
    /// never corrupted.
    pub fn restore(&self, source: &dyn Store, target: &dyn Store) -> Result<RestoreReport> {
        info!(
            "restoring store {} into store {}{}",
            source.name(),
            target.name(),
            if self.dry_run { " (dry run)" } else { "" }
        );

        let source_root = source.root()?;
        let target_root = target.root()?;

        let mut report = RestoreReport {
            dry_run: self.dry_run,
            ..RestoreReport::default()
        };
        self.restore_pair(source, target, &source_root, &target_root, 0, &mut report);

        info!(
            "restore done: {} folders and {} items restored, {} duplicates skipped, {} errors",
            report.folders_restored,
            report.items_restored,
            report.duplicates_skipped,
            report.errors
        );
        Ok(report)
    }

    fn restore_pair(
        &self,
        source: &dyn Store,
        target: &dyn Store,
        source_folder: &Folder,
        target_folder: &Folder,
        depth: usize,
        report: &mut RestoreReport,
    ) {
        (self.on_progress)(ReconcileProgressEvent::CheckFolder(
            source_folder.path.clone(),
        ));
        debug!("restoring folder pair {}", source_folder.path);

        let source_count = source.count_items_or_zero(source_folder);
        let target_count = target.count_items_or_zero(target_folder);

        if source_count > target_count {
            self.restore_items(source, target, source_folder, target_folder, report);
        } else {
            report.folders_checked += 1;
            report.record(&source_folder.path, RestoreOutcome::Checked);
        }

        let source_children = match source.list_folders(source_folder) {
            Ok(children) => children,
            Err(err) => {
                let err = Error::ListFoldersError(
                    err,
                    source_folder.path.clone(),
                    source.name().to_owned(),
                );
                report.record_failure(&source_folder.path, err.to_string());
                return;
            }
        };
        let target_children = match target.list_folders(target_folder) {
            Ok(children) => children,
            Err(err) => {
                let err = Error::ListFoldersError(
                    err,
                    target_folder.path.clone(),
                    target.name().to_owned(),
                );
                report.record_failure(&source_folder.path, err.to_string());
                return;
            }
        };

        // Target-only folders are left alone: restoring is
        // directional, the comparison report is where they show up.
        let target_by_name: HashMap<&str, &Folder> = target_children
            .iter()
            .map(|folder| (folder.name.as_str(), folder))
            .collect();

        for child in &source_children {
            match target_by_name.get(child.name.as_str()) {
                Some(target_child) => {
                    if depth + 1 > self.max_depth {
                        warn!(
                            "traversal depth bound {} reached at {}, not descending",
                            self.max_depth, child.path
                        );
                        report.truncated += 1;
                        report.record(
                            &child.path,
                            RestoreOutcome::Failed {
                                reason: format!(
                                    "traversal depth bound {} reached",
                                    self.max_depth
                                ),
                            },
                        );
                        continue;
                    }
                    self.restore_pair(source, target, child, target_child, depth + 1, report);
                }
                None => self.restore_folder(source, target, child, target_folder, report),
            }
        }
    }

    /// The folder is absent from the target: one bulk copy brings
    /// the folder, its items and all its descendants. No recursion
    /// afterwards, the copy already did.
    fn restore_folder(
        &self,
        source: &dyn Store,
        target: &dyn Store,
        folder: &Folder,
        dest_parent: &Folder,
        report: &mut RestoreReport,
    ) {
        (self.on_progress)(ReconcileProgressEvent::RestoreFolder(folder.path.clone()));

        if self.dry_run {
            let items = copy::subtree_item_count(source, folder);
            report.folders_restored += 1;
            report.items_restored += items;
            report.record(&folder.path, RestoreOutcome::RestoredFolder { items });
            return;
        }

        match copy::copy_folder(source, folder, target, dest_parent, &self.retry) {
            Ok(items) => {
                report.folders_restored += 1;
                report.items_restored += items;
                report.record(&folder.path, RestoreOutcome::RestoredFolder { items });
            }
            Err(err) => {
                report.record_failure(&folder.path, err.to_string());
            }
        }
    }

    /// The folder exists on both sides but the source holds more
    /// items: copy the items the signature index does not know,
    /// skip the ones it does.
    fn restore_items(
        &self,
        source: &dyn Store,
        target: &dyn Store,
        source_folder: &Folder,
        target_folder: &Folder,
        report: &mut RestoreReport,
    ) {
        (self.on_progress)(ReconcileProgressEvent::BuildSignatureIndex(
            target_folder.path.clone(),
        ));

        let target_items = match target.list_items(target_folder) {
            Ok(items) => items,
            Err(err) => {
                let err = Error::BuildSignatureIndexError(err, target_folder.path.clone());
                report.record_failure(&source_folder.path, err.to_string());
                return;
            }
        };
        let index = SignatureIndex::build(&*self.signature, &target_items);

        let source_items = match source.list_items(source_folder) {
            Ok(items) => items,
            Err(err) => {
                let err = Error::ListItemsError(
                    err,
                    source_folder.path.clone(),
                    source.name().to_owned(),
                );
                report.record_failure(&source_folder.path, err.to_string());
                return;
            }
        };

        let mut copied = 0;
        let mut skipped = 0;

        for item in &source_items {
            if index.contains(&*self.signature, item) {
                skipped += 1;
                continue;
            }
            if self.dry_run {
                copied += 1;
                continue;
            }
            match copy::copy_item(source, source_folder, item, target, target_folder, &self.retry)
            {
                Ok(()) => copied += 1,
                Err(err) => {
                    report.record_failure(&source_folder.path, err.to_string());
                }
            }
        }

        report.items_restored += copied;
        report.duplicates_skipped += skipped;
        report.record(
            &source_folder.path,
            RestoreOutcome::RestoredItems { copied, skipped },
        );
        (self.on_progress)(ReconcileProgressEvent::RestoreItems(
            source_folder.path.clone(),
            copied,
        ));
    }
}
