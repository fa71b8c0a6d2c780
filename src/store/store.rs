//! Store facade module.
//!
//! This module exposes the store trait, the uniform read/copy
//! surface over a hierarchical mail container. One adapter exists
//! per concrete backend, the reconciliation engine only ever sees
//! this trait.

use log::warn;
use std::{path::Path, result};
use thiserror::Error;

use crate::{store::memory, Folder, FolderPath, Item};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open store {1}")]
    OpenStoreError(#[source] Box<Error>, String),
    #[error("cannot find store at index {0}")]
    FindStoreError(usize),
    #[error("cannot copy folder {1}")]
    CopyFolderError(#[source] Box<Error>, FolderPath),
    #[error("cannot copy item into folder {1}")]
    CopyItemError(#[source] Box<Error>, FolderPath),

    #[error(transparent)]
    MemoryStoreError(#[from] memory::Error),
    #[cfg(feature = "maildir-store")]
    #[error(transparent)]
    MaildirStoreError(#[from] super::maildir::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the store access facade.
///
/// Read operations are plain blocking calls without retries: the
/// callers either absorb their failures (item counting) or record
/// them and move on to the next sibling. Write operations are only
/// reached through [`crate::store::copy`], which wraps them in a
/// bounded retry.
pub trait Store {
    /// Returns the display name of the store.
    fn name(&self) -> &str;

    /// Returns the backing file path of the store, if any.
    fn path(&self) -> Option<&Path>;

    /// Returns the root folder of the store.
    fn root(&self) -> Result<Folder>;

    /// Lists the direct child folders of the given folder.
    fn list_folders(&self, folder: &Folder) -> Result<Vec<Folder>>;

    /// Counts the items owned by the given folder, children
    /// excluded.
    fn count_items(&self, folder: &Folder) -> Result<usize>;

    /// Lists the items owned by the given folder. The sequence is
    /// finite and rebuilt on every call.
    fn list_items(&self, folder: &Folder) -> Result<Vec<Item>>;

    /// Fetches the raw payload of an item.
    fn fetch_item(&self, folder: &Folder, item: &Item) -> Result<Vec<u8>>;

    /// Creates a child folder under the given parent and returns
    /// it.
    fn add_folder(&self, parent: &Folder, name: &str) -> Result<Folder>;

    /// Appends an item to the given folder from its raw payload.
    fn add_item(&self, folder: &Folder, item: &Item, raw: &[u8]) -> Result<()>;

    /// Counts items, absorbing the failure as 0. An uncountable
    /// folder must never abort a traversal.
    fn count_items_or_zero(&self, folder: &Folder) -> usize {
        self.count_items(folder).unwrap_or_else(|err| {
            warn!(
                "cannot count items of folder {} in store {}, assuming 0: {}",
                folder.path,
                self.name(),
                err
            );
            0
        })
    }

    /// Lists child folders, absorbing the failure as an empty list.
    fn list_folders_or_empty(&self, folder: &Folder) -> Vec<Folder> {
        self.list_folders(folder).unwrap_or_else(|err| {
            warn!(
                "cannot list folders under {} in store {}, assuming none: {}",
                folder.path,
                self.name(),
                err
            );
            Vec::new()
        })
    }
}

/// Represents an openable store as enumerated by a provider. The
/// index is stable across [`StoreProvider::list_stores`] and
/// [`StoreProvider::open`] calls within one provider instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreHandle {
    pub index: usize,
    pub name: String,
    pub path: Option<std::path::PathBuf>,
}

/// Represents the external collaborator that enumerates and opens
/// stores. Opening is the only operation of a run allowed to fail
/// fatally: a store that cannot be opened at all aborts the run
/// before any traversal starts.
pub trait StoreProvider {
    fn list_stores(&self) -> Result<Vec<StoreHandle>>;
    fn open(&self, index: usize) -> Result<Box<dyn Store>>;
}
