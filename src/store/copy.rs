//! Copy module.
//!
//! This module contains the cross-store copy operations. Reading
//! happens on the source facade, writing on the target facade, and
//! only the writing half is retried: a busy backend is expected to
//! recover within a few attempts, while a failing read is handled
//! by the engines themselves.

use log::{debug, warn};
use std::{thread, time::Duration};

use crate::{Folder, Item, Store};

use super::{Error, Result};

pub const DEFAULT_RETRY_ATTEMPTS: usize = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Represents the bounded fixed-delay retry applied to store write
/// operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

fn retrying<T>(retry: &RetryPolicy, what: &str, mut run: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 1;
    loop {
        match run() {
            Ok(val) => return Ok(val),
            Err(err) if attempt < retry.attempts => {
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    what, attempt, retry.attempts, retry.delay, err
                );
                attempt += 1;
                thread::sleep(retry.delay);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Copies a whole folder from the source store under the given
/// parent of the target store: the folder itself, all its items,
/// then all its descendants. Returns the number of items copied
/// across the subtree.
///
/// Every copy commits independently, so an interrupted bulk copy
/// leaves a partially filled folder behind. The next restore run
/// finds that folder present on both sides and falls back to
/// item-level reconciliation, which fills the gap without
/// duplicating anything.
pub fn copy_folder(
    source: &dyn Store,
    folder: &Folder,
    target: &dyn Store,
    dest_parent: &Folder,
    retry: &RetryPolicy,
) -> Result<usize> {
    copy_folder_tree(source, folder, target, dest_parent, retry)
        .map_err(|err| Error::CopyFolderError(Box::new(err), folder.path.clone()))
}

fn copy_folder_tree(
    source: &dyn Store,
    folder: &Folder,
    target: &dyn Store,
    dest_parent: &Folder,
    retry: &RetryPolicy,
) -> Result<usize> {
    debug!("copying folder {} under {}", folder.path, dest_parent.path);

    let dest = retrying(retry, "adding folder", || {
        target.add_folder(dest_parent, &folder.name)
    })?;

    let mut copied = 0;

    for item in source.list_items(folder)? {
        let raw = source.fetch_item(folder, &item)?;
        retrying(retry, "adding item", || target.add_item(&dest, &item, &raw))?;
        copied += 1;
    }

    for child in source.list_folders(folder)? {
        copied += copy_folder_tree(source, &child, target, &dest, retry)?;
    }

    Ok(copied)
}

/// Copies a single item from a source folder into a target folder.
pub fn copy_item(
    source: &dyn Store,
    folder: &Folder,
    item: &Item,
    target: &dyn Store,
    dest: &Folder,
    retry: &RetryPolicy,
) -> Result<()> {
    debug!("copying item {:?} into {}", item.subject, dest.path);

    let raw = source
        .fetch_item(folder, item)
        .map_err(|err| Error::CopyItemError(Box::new(err), dest.path.clone()))?;

    retrying(retry, "adding item", || target.add_item(dest, item, &raw))
        .map_err(|err| Error::CopyItemError(Box::new(err), dest.path.clone()))
}

/// Counts the items of a whole subtree, absorbing read failures.
/// Used to size dry-run folder restores without writing anything.
pub fn subtree_item_count(store: &dyn Store, folder: &Folder) -> usize {
    let mut count = store.count_items_or_zero(folder);
    for child in store.list_folders_or_empty(folder) {
        count += subtree_item_count(store, &child);
    }
    count
}
