//! Memory store module.
//!
//! This module contains the in-memory store adapter. It backs the
//! test suite and the benches, and doubles as the reference
//! implementation of the store facade: no I/O, no encoding, just
//! the tree semantics.

use std::{
    cell::{Cell, RefCell},
    path::Path,
    result,
};
use thiserror::Error;

use crate::{store, Folder, FolderPath, Item, Store};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find folder {0}")]
    FindFolderError(FolderPath),
    #[error("cannot find item {0} in folder {1}")]
    FindItemError(String, FolderPath),
    #[error("cannot add folder {1}: a sibling of folder {0} already has this name")]
    FolderExistsError(FolderPath, String),
}

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Default)]
struct MemItem {
    item: Item,
    raw: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemFolder {
    name: String,
    folders: Vec<MemFolder>,
    items: Vec<MemItem>,
}

impl MemFolder {
    fn find(&self, path: &[String]) -> Option<&MemFolder> {
        match path.split_first() {
            None => Some(self),
            Some((name, rest)) => self
                .folders
                .iter()
                .find(|folder| &folder.name == name)
                .and_then(|folder| folder.find(rest)),
        }
    }

    fn find_mut(&mut self, path: &[String]) -> Option<&mut MemFolder> {
        match path.split_first() {
            None => Some(self),
            Some((name, rest)) => self
                .folders
                .iter_mut()
                .find(|folder| &folder.name == name)
                .and_then(|folder| folder.find_mut(rest)),
        }
    }
}

/// Represents the in-memory store.
pub struct MemoryStore {
    name: String,
    root: RefCell<MemFolder>,
    next_id: Cell<u64>,
}

impl MemoryStore {
    pub fn new<N: ToString>(name: N) -> Self {
        Self {
            name: name.to_string(),
            root: RefCell::new(MemFolder::default()),
            next_id: Cell::new(0),
        }
    }

    fn fresh_id(&self) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        format!("mem-{}", id)
    }

    /// Creates every missing folder along the given path. Test and
    /// fixture helper, the facade only creates one folder at a
    /// time.
    pub fn create_folder(&self, path: &FolderPath) -> store::Result<Folder> {
        let mut root = self.root.borrow_mut();
        let mut folder = &mut *root;
        for name in path.segments() {
            let pos = match folder.folders.iter().position(|child| &child.name == name) {
                Some(pos) => pos,
                None => {
                    folder.folders.push(MemFolder {
                        name: name.clone(),
                        ..MemFolder::default()
                    });
                    folder.folders.len() - 1
                }
            };
            folder = &mut folder.folders[pos];
        }
        Ok(Folder {
            name: path.name().unwrap_or(&self.name).to_string(),
            path: path.clone(),
        })
    }

    /// Appends an item with its raw payload to the folder at the
    /// given path, assigning a fresh internal id.
    pub fn append_item(&self, path: &FolderPath, item: Item, raw: Vec<u8>) -> store::Result<Item> {
        let mut root = self.root.borrow_mut();
        let folder = root
            .find_mut(path.segments())
            .ok_or_else(|| Error::FindFolderError(path.clone()))?;
        let item = Item {
            internal_id: self.fresh_id(),
            ..item
        };
        folder.items.push(MemItem {
            item: item.clone(),
            raw,
        });
        Ok(item)
    }
}

impl Store for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> Option<&Path> {
        None
    }

    fn root(&self) -> store::Result<Folder> {
        Ok(Folder::root(&self.name))
    }

    fn list_folders(&self, folder: &Folder) -> store::Result<Vec<Folder>> {
        let root = self.root.borrow();
        let mem = root
            .find(folder.path.segments())
            .ok_or_else(|| Error::FindFolderError(folder.path.clone()))?;
        Ok(mem
            .folders
            .iter()
            .map(|child| Folder::new(&folder.path, &child.name))
            .collect())
    }

    fn count_items(&self, folder: &Folder) -> store::Result<usize> {
        let root = self.root.borrow();
        let mem = root
            .find(folder.path.segments())
            .ok_or_else(|| Error::FindFolderError(folder.path.clone()))?;
        Ok(mem.items.len())
    }

    fn list_items(&self, folder: &Folder) -> store::Result<Vec<Item>> {
        let root = self.root.borrow();
        let mem = root
            .find(folder.path.segments())
            .ok_or_else(|| Error::FindFolderError(folder.path.clone()))?;
        Ok(mem.items.iter().map(|entry| entry.item.clone()).collect())
    }

    fn fetch_item(&self, folder: &Folder, item: &Item) -> store::Result<Vec<u8>> {
        let root = self.root.borrow();
        let mem = root
            .find(folder.path.segments())
            .ok_or_else(|| Error::FindFolderError(folder.path.clone()))?;
        let entry = mem
            .items
            .iter()
            .find(|entry| entry.item.internal_id == item.internal_id)
            .ok_or_else(|| {
                Error::FindItemError(item.internal_id.clone(), folder.path.clone())
            })?;
        Ok(entry.raw.clone())
    }

    fn add_folder(&self, parent: &Folder, name: &str) -> store::Result<Folder> {
        let mut root = self.root.borrow_mut();
        let mem = root
            .find_mut(parent.path.segments())
            .ok_or_else(|| Error::FindFolderError(parent.path.clone()))?;
        if mem.folders.iter().any(|child| child.name == name) {
            return Err(Error::FolderExistsError(parent.path.clone(), name.to_string()))?;
        }
        mem.folders.push(MemFolder {
            name: name.to_string(),
            ..MemFolder::default()
        });
        Ok(Folder::new(&parent.path, name))
    }

    fn add_item(&self, folder: &Folder, item: &Item, raw: &[u8]) -> store::Result<()> {
        let mut root = self.root.borrow_mut();
        let mem = root
            .find_mut(folder.path.segments())
            .ok_or_else(|| Error::FindFolderError(folder.path.clone()))?;
        mem.items.push(MemItem {
            item: Item {
                internal_id: self.fresh_id(),
                ..item.clone()
            },
            raw: raw.to_vec(),
        });
        Ok(())
    }
}
