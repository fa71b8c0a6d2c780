//! Maildir store module.
//!
//! This module contains the maildir store adapter. The folder
//! hierarchy is encoded the maildir++ way: every folder lives as a
//! subdirectory of the store root named after its dot-joined path,
//! prefixed with a dot (`Inbox/Projects` -> `.Inbox.Projects`). The
//! store root itself is a plain maildir and owns the root items.

use log::{debug, trace};
use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
    result,
};
use thiserror::Error;

use crate::{store, Folder, FolderPath, Item, Store, StoreHandle, StoreProvider};

use super::item;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read maildir directory {0}")]
    ReadDirError(PathBuf),
    #[error("cannot parse maildir subdirectory {0}")]
    ParseSubdirError(PathBuf),
    #[error("cannot decode maildir subdirectory")]
    DecodeSubdirError(#[source] io::Error),
    #[error("cannot decode maildir entry")]
    DecodeEntryError(#[source] io::Error),
    #[error("cannot parse maildir message")]
    ParseMsgError(#[source] maildir::MailEntryError),
    #[error("cannot decode header {1}")]
    DecodeHeaderError(#[source] rfc2047_decoder::Error, String),
    #[error("cannot parse maildir message header {1}")]
    ParseHeaderError(#[source] mailparse::MailParseError, String),
    #[error("cannot create maildir subdirectory {1}")]
    CreateSubdirError(#[source] io::Error, String),
    #[error("cannot store maildir message")]
    StoreMsgError(#[source] maildir::MaildirError),
    #[error("cannot find maildir message {0}")]
    FindMsgError(String),
    #[error("cannot list maildir stores at {1}")]
    ListStoresError(#[source] io::Error, PathBuf),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the maildir store.
pub struct MaildirStore {
    name: String,
    mdir: maildir::Maildir,
}

impl MaildirStore {
    pub fn new<N: ToString, P: Into<PathBuf>>(name: N, root_dir: P) -> Result<Self> {
        let root_dir = root_dir.into();
        if !root_dir.is_dir() {
            return Err(Error::ReadDirError(root_dir));
        }
        Ok(Self {
            name: name.to_string(),
            mdir: root_dir.into(),
        })
    }

    fn encoded_subdir(path: &FolderPath) -> String {
        format!(".{}", path.segments().join("."))
    }

    /// Creates a maildir instance for the folder at the given path.
    fn mdir_of(&self, path: &FolderPath) -> Result<maildir::Maildir> {
        if path.is_root() {
            return Ok(maildir::Maildir::from(self.mdir.path().to_owned()));
        }
        let dir = self.mdir.path().join(Self::encoded_subdir(path));
        if dir.is_dir() {
            Ok(maildir::Maildir::from(dir))
        } else {
            Err(Error::ReadDirError(dir))
        }
    }
}

impl Store for MaildirStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> Option<&Path> {
        Some(self.mdir.path())
    }

    fn root(&self) -> store::Result<Folder> {
        if !self.mdir.path().is_dir() {
            return Err(Error::ReadDirError(self.mdir.path().to_owned()))?;
        }
        Ok(Folder::root(&self.name))
    }

    fn list_folders(&self, folder: &Folder) -> store::Result<Vec<Folder>> {
        let want = folder.path.segments();
        let mut folders = Vec::new();

        for entry in self.mdir.list_subdirs() {
            let dir = entry.map_err(Error::DecodeSubdirError)?;
            let dirname = dir
                .path()
                .file_name()
                .and_then(OsStr::to_str)
                .and_then(|s| if s.len() < 2 { None } else { Some(&s[1..]) })
                .ok_or_else(|| Error::ParseSubdirError(dir.path().to_owned()))?;

            let segments: Vec<String> = dirname.split('.').map(ToOwned::to_owned).collect();
            if segments.len() == want.len() + 1 && segments[..want.len()] == *want {
                folders.push(Folder::new(&folder.path, &segments[want.len()]));
            }
        }

        trace!("folders under {}: {:?}", folder.path, folders);
        Ok(folders)
    }

    fn count_items(&self, folder: &Folder) -> store::Result<usize> {
        let mdir = self.mdir_of(&folder.path)?;
        Ok(mdir.count_cur() + mdir.count_new())
    }

    fn list_items(&self, folder: &Folder) -> store::Result<Vec<Item>> {
        let mdir = self.mdir_of(&folder.path)?;

        let mut items = item::from_raws(mdir.list_cur())?;
        items.extend(item::from_raws(mdir.list_new())?);

        debug!("items in {}: {}", folder.path, items.len());
        Ok(items)
    }

    fn fetch_item(&self, folder: &Folder, item: &Item) -> store::Result<Vec<u8>> {
        let mdir = self.mdir_of(&folder.path)?;
        let mut entry = mdir
            .find(&item.internal_id)
            .ok_or_else(|| Error::FindMsgError(item.internal_id.clone()))?;
        let raw = entry
            .parsed()
            .map_err(Error::ParseMsgError)?
            .raw_bytes
            .to_vec();
        Ok(raw)
    }

    fn add_folder(&self, parent: &Folder, name: &str) -> store::Result<Folder> {
        let path = parent.path.join(name);
        let dir = self.mdir.path().join(Self::encoded_subdir(&path));
        debug!("subdir path: {:?}", dir);

        maildir::Maildir::from(dir)
            .create_dirs()
            .map_err(|err| Error::CreateSubdirError(err, name.to_owned()))?;
        Ok(Folder::new(&parent.path, name))
    }

    fn add_item(&self, folder: &Folder, _item: &Item, raw: &[u8]) -> store::Result<()> {
        let mdir = self.mdir_of(&folder.path)?;
        let id = mdir
            .store_cur_with_flags(raw, "")
            .map_err(Error::StoreMsgError)?;
        trace!("stored maildir message: {:?}", id);
        Ok(())
    }
}

/// Represents a directory of maildir stores, one subdirectory per
/// store. The provider enumerates them in name order so indices
/// stay stable between listing and opening.
pub struct MaildirRoot {
    root: PathBuf,
}

impl MaildirRoot {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl StoreProvider for MaildirRoot {
    fn list_stores(&self) -> store::Result<Vec<StoreHandle>> {
        let entries =
            fs::read_dir(&self.root).map_err(|err| Error::ListStoresError(err, self.root.clone()))?;

        let mut stores = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| Error::ListStoresError(err, self.root.clone()))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match path.file_name().and_then(OsStr::to_str) {
                Some(name) if !name.starts_with('.') => stores.push((name.to_owned(), path)),
                _ => continue,
            }
        }
        stores.sort();

        Ok(stores
            .into_iter()
            .enumerate()
            .map(|(index, (name, path))| StoreHandle {
                index,
                name,
                path: Some(path),
            })
            .collect())
    }

    fn open(&self, index: usize) -> store::Result<Box<dyn Store>> {
        let handle = self
            .list_stores()?
            .into_iter()
            .nth(index)
            .ok_or(store::Error::FindStoreError(index))?;
        match handle.path {
            Some(path) => {
                let store = MaildirStore::new(&handle.name, path).map_err(|err| {
                    store::Error::OpenStoreError(Box::new(err.into()), handle.name.clone())
                })?;
                Ok(Box::new(store))
            }
            None => Err(store::Error::FindStoreError(index)),
        }
    }
}
