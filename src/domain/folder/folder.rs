//! Folder module.
//!
//! This module contains the representation of a mail store folder
//! and its position in the folder tree.

use serde::Serialize;
use std::fmt;

/// Represents the position of a folder inside a store, as the
/// ordered list of folder names from the root down to the folder
/// itself. The root of a store has an empty path.
///
/// Folder names are only unique among siblings, so a full path is
/// the only way to address a folder unambiguously. Paths are
/// compared case-sensitively, like folder names.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct FolderPath(Vec<String>);

impl FolderPath {
    /// Builds the path of a store root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of segments, which is also the depth of
    /// the folder in the tree (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the name of the folder the path points to, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Builds the path of a child folder.
    pub fn join<N: ToString>(&self, name: N) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.0.join("/"))
        }
    }
}

impl<S: ToString> FromIterator<S> for FolderPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|segment| segment.to_string()).collect())
    }
}

/// Represents a folder of a mail store.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Folder {
    /// Represents the folder name. Unique among siblings only.
    pub name: String,
    /// Represents the full path of the folder, last segment
    /// included (empty for the store root).
    pub path: FolderPath,
}

impl Folder {
    /// Builds the root folder of a store. The root carries the
    /// store display name but an empty path.
    pub fn root<N: ToString>(name: N) -> Self {
        Self {
            name: name.to_string(),
            path: FolderPath::root(),
        }
    }

    /// Builds a folder located under the given parent path.
    pub fn new<N: ToString>(parent: &FolderPath, name: N) -> Self {
        let name = name.to_string();
        Self {
            path: parent.join(&name),
            name,
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::{Folder, FolderPath};

    #[test]
    fn folder_path_display() {
        assert_eq!("/", FolderPath::root().to_string());
        assert_eq!(
            "Inbox/Projects",
            FolderPath::root().join("Inbox").join("Projects").to_string()
        );
    }

    #[test]
    fn folder_new_extends_parent_path() {
        let parent = FolderPath::root().join("Inbox");
        let folder = Folder::new(&parent, "Projects");
        assert_eq!("Projects", folder.name);
        assert_eq!(2, folder.path.depth());
        assert_eq!(Some("Projects"), folder.path.name());
    }
}
