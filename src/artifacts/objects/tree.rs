//! Tree snapshots
//!
//! Trees represent directory snapshots. They contain entries for files (blobs),
//! subdirectories (other trees) and submodules (commits of another repository).
//!
//! ## Arena
//!
//! Trees loaded while navigating a snapshot are kept in a [`TreeArena`].
//! A tree refers to its parent and an entry to its owning tree by
//! [`TreeIdx`], which is enough to rebuild the full path of anything that
//! was reached by path resolution.
//!
//! ## Ordering
//!
//! Entries are listed directories and submodules first, then everything
//! else; each group is ordered by the bytes of the name.

use crate::areas::store::ObjectStore;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Position of a tree inside its [`TreeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeIdx(usize);

#[derive(Debug, Clone)]
pub struct TreeEntry {
    oid: ObjectId,
    mode: EntryMode,
    name: String,
    owner: TreeIdx,
    size: OnceLock<u64>,
}

impl TreeEntry {
    fn from_record(record: DatabaseEntry, owner: TreeIdx) -> Self {
        TreeEntry {
            oid: record.oid,
            mode: record.mode,
            name: unescape_chars(&record.name),
            owner,
            size: OnceLock::new(),
        }
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tree this entry was listed in
    pub fn owner(&self) -> TreeIdx {
        self.owner
    }

    pub fn is_dir(&self) -> bool {
        self.mode.is_tree()
    }

    pub fn is_submodule(&self) -> bool {
        self.mode.is_submodule()
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.mode, EntryMode::Symlink)
    }

    pub fn is_executable(&self) -> bool {
        matches!(self.mode, EntryMode::File(FileMode::Executable))
    }

    /// Entries with file content: regular, executable and symlink
    pub fn is_blob(&self) -> bool {
        matches!(self.mode, EntryMode::File(_) | EntryMode::Symlink)
    }

    /// Size of the entry's content in bytes
    ///
    /// Directories and submodules report 0. The value is fetched from the
    /// store once and cached.
    pub fn size(&self, store: &dyn ObjectStore) -> Result<u64> {
        if !self.is_blob() {
            return Ok(0);
        }
        if let Some(size) = self.size.get() {
            return Ok(*size);
        }

        let size = store.stat_object(&self.oid)?.size;
        Ok(*self.size.get_or_init(|| size))
    }

    /// View this entry as file content
    pub fn blob(&self) -> Option<Blob> {
        self.is_blob().then(|| Blob::new(self.clone()))
    }

    fn sort_group(&self) -> u8 {
        if self.is_dir() || self.is_submodule() { 0 } else { 1 }
    }

    /// Listing order: directories and submodules first, then by name bytes
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.sort_group()
            .cmp(&other.sort_group())
            .then_with(|| self.name.as_bytes().cmp(other.name.as_bytes()))
    }
}

/// Sort entries into listing order
pub fn sort_entries(entries: &mut [TreeEntry]) {
    entries.sort_by(TreeEntry::canonical_cmp);
}

/// Drop escaping backslashes from a raw entry name
///
/// A backslash escapes the next character; an escaped backslash is kept.
pub fn unescape_chars(name: &str) -> String {
    if !name.contains('\\') {
        return name.to_string();
    }

    let mut unescaped = String::with_capacity(name.len());
    let mut escaping = false;
    for c in name.chars() {
        if c == '\\' && !escaping {
            escaping = true;
            continue;
        }
        escaping = false;
        unescaped.push(c);
    }

    unescaped
}

#[derive(Debug)]
pub struct Tree {
    oid: ObjectId,
    name: String,
    parent: Option<TreeIdx>,
    entries: Vec<TreeEntry>,
    subtrees: HashMap<String, TreeIdx>,
}

impl Tree {
    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    /// Name of this directory in its parent; empty for a root tree
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<TreeIdx> {
        self.parent
    }

    /// Entries in listing order
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

/// Trees of one snapshot, loaded on demand while resolving paths
#[derive(Debug)]
pub struct TreeArena {
    store: Arc<dyn ObjectStore>,
    trees: Vec<Tree>,
}

impl TreeArena {
    /// Load the root tree of a snapshot
    pub fn load(store: Arc<dyn ObjectStore>, oid: ObjectId) -> Result<Self> {
        let mut arena = TreeArena {
            store,
            trees: Vec::new(),
        };
        arena.load_tree(oid, String::new(), None)?;

        Ok(arena)
    }

    pub fn root(&self) -> TreeIdx {
        TreeIdx(0)
    }

    pub fn tree(&self, idx: TreeIdx) -> &Tree {
        &self.trees[idx.0]
    }

    pub fn entries(&self, idx: TreeIdx) -> &[TreeEntry] {
        &self.trees[idx.0].entries
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn load_tree(&mut self, oid: ObjectId, name: String, parent: Option<TreeIdx>) -> Result<TreeIdx> {
        let idx = TreeIdx(self.trees.len());
        let record = self.store.open_tree(&oid)?;

        let mut entries = record
            .into_entries()
            .into_iter()
            .map(|entry| TreeEntry::from_record(entry, idx))
            .collect::<Vec<_>>();
        sort_entries(&mut entries);
        trace!(%oid, entries = entries.len(), "loaded tree");

        self.trees.push(Tree {
            oid,
            name,
            parent,
            entries,
            subtrees: HashMap::new(),
        });

        Ok(idx)
    }

    /// Full path of a tree relative to the arena root
    pub fn path_of(&self, idx: TreeIdx) -> String {
        let mut names = Vec::new();
        let mut current = Some(idx);
        while let Some(tree_idx) = current {
            let tree = self.tree(tree_idx);
            if !tree.name.is_empty() {
                names.push(tree.name.as_str());
            }
            current = tree.parent;
        }
        names.reverse();

        names.join("/")
    }

    /// Full path of an entry relative to the arena root
    pub fn entry_path(&self, entry: &TreeEntry) -> String {
        let parent_path = self.path_of(entry.owner);
        if parent_path.is_empty() {
            entry.name.clone()
        } else {
            format!("{parent_path}/{}", entry.name)
        }
    }

    /// Descend into the directory `name` of the tree at `idx`
    fn child(&mut self, idx: TreeIdx, name: &str, path: &str) -> Result<TreeIdx> {
        if let Some(child) = self.trees[idx.0].subtrees.get(name) {
            return Ok(*child);
        }

        let entry = self.trees[idx.0]
            .find(name)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        if !entry.is_dir() {
            return Err(Error::NotADirectory(path.to_string()));
        }

        let oid = entry.oid;
        let child = self.load_tree(oid, name.to_string(), Some(idx))?;
        self.trees[idx.0].subtrees.insert(name.to_string(), child);

        Ok(child)
    }

    /// Walk directory segments starting at `idx`
    fn descend(&mut self, idx: TreeIdx, segments: &[&str]) -> Result<TreeIdx> {
        let mut current = idx;
        for depth in 0..segments.len() {
            let walked = segments[..=depth].join("/");
            current = self.child(current, segments[depth], &walked)?;
        }

        Ok(current)
    }

    /// Resolve a directory path below `idx`; an empty path is `idx` itself
    pub fn sub_tree(&mut self, idx: TreeIdx, path: &str) -> Result<TreeIdx> {
        let segments = clean_path(path);
        self.descend(idx, &segments)
    }

    /// Resolve a path below `idx` to an entry
    ///
    /// An empty path resolves to the tree itself. Every intermediate segment
    /// must name a directory ([`Error::NotADirectory`] otherwise) and a missing
    /// last segment is [`Error::NotFound`].
    pub fn resolve(&mut self, idx: TreeIdx, path: &str) -> Result<TreeEntry> {
        let segments = clean_path(path);
        let Some((last, dirs)) = segments.split_last() else {
            return Ok(self.self_entry(idx));
        };

        let owner = self.descend(idx, dirs)?;
        self.tree(owner)
            .find(last)
            .cloned()
            .ok_or_else(|| Error::NotFound(segments.join("/")))
    }

    /// Resolve a path to file content; directories are [`Error::NotFound`]
    pub fn blob(&mut self, idx: TreeIdx, path: &str) -> Result<Blob> {
        self.resolve(idx, path)?
            .blob()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    fn self_entry(&self, idx: TreeIdx) -> TreeEntry {
        let tree = self.tree(idx);
        TreeEntry {
            oid: tree.oid,
            mode: EntryMode::Directory,
            name: tree.name.clone(),
            owner: tree.parent.unwrap_or(idx),
            size: OnceLock::new(),
        }
    }
}

/// Split a slash separated path, dropping empty and `.` segments and
/// letting `..` remove the segment before it
fn clean_path(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    segments
}
