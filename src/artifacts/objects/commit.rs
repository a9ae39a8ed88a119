//! Commits
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (for history)
//! - Author and committer information
//! - Commit message
//!
//! A commit is immutable once loaded. The only derived data, its submodule
//! table, is computed on first use and cached.

use crate::areas::store::ObjectStore;
use crate::artifacts::database::commit_record::CommitRecord;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::signature::Signature;
use crate::artifacts::objects::submodule::{GITMODULES_PATH, SubModule, SubModules, parse_gitmodules};
use crate::artifacts::objects::tree::{TreeArena, TreeEntry};
use crate::errors::{Error, Result};
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Commit {
    oid: ObjectId,
    tree: ObjectId,
    parents: Vec<ObjectId>,
    author: Signature,
    committer: Signature,
    message: String,
    submodules: OnceLock<SubModules>,
}

impl Commit {
    pub fn from_record(oid: ObjectId, record: CommitRecord) -> Self {
        Commit {
            oid,
            tree: record.tree,
            parents: record.parents,
            author: record.author,
            committer: record.committer,
            message: record.message,
            submodules: OnceLock::new(),
        }
    }

    /// Load a commit from the store
    ///
    /// Fails with [`Error::MissingObject`] if it is absent and with
    /// [`Error::InvalidTarget`] if `oid` names another kind of object.
    pub fn load(store: &dyn ObjectStore, oid: &ObjectId) -> Result<Self> {
        let record = store.open_commit(oid)?;
        Ok(Self::from_record(*oid, record))
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    /// The `n`th parent, 0-based
    pub fn parent(&self, n: usize) -> Option<&ObjectId> {
        self.parents.get(n)
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// Commit time in seconds since the epoch, used to order history
    pub fn timestamp(&self) -> i64 {
        self.committer.timestamp().timestamp()
    }

    pub fn tree(&self, store: &Arc<dyn ObjectStore>) -> Result<TreeArena> {
        TreeArena::load(store.clone(), self.tree)
    }

    pub fn tree_entry(&self, store: &Arc<dyn ObjectStore>, path: &str) -> Result<TreeEntry> {
        let mut arena = self.tree(store)?;
        arena.resolve(arena.root(), path)
    }

    pub fn blob(&self, store: &Arc<dyn ObjectStore>, path: &str) -> Result<Blob> {
        let mut arena = self.tree(store)?;
        arena.blob(arena.root(), path)
    }

    /// Whether the file at `path` looks like an image; unreadable or
    /// missing paths are not images
    pub fn is_image_file(&self, store: &Arc<dyn ObjectStore>, path: &str) -> bool {
        self.blob(store, path)
            .and_then(|blob| blob.is_image(store.as_ref()))
            .unwrap_or(false)
    }

    /// Submodules declared in this commit's `.gitmodules`
    ///
    /// A commit without `.gitmodules` has none.
    pub fn submodules(&self, store: &Arc<dyn ObjectStore>) -> Result<&SubModules> {
        if let Some(submodules) = self.submodules.get() {
            return Ok(submodules);
        }

        let submodules = match self.blob(store, GITMODULES_PATH) {
            Ok(blob) => parse_gitmodules(&String::from_utf8_lossy(&blob.data(store.as_ref())?)),
            Err(Error::NotFound(_)) => SubModules::new(),
            Err(err) => return Err(err),
        };
        debug!(commit = %self.oid, count = submodules.len(), "parsed submodules");

        Ok(self.submodules.get_or_init(|| submodules))
    }

    pub fn submodule(&self, store: &Arc<dyn ObjectStore>, path: &str) -> Result<Option<&SubModule>> {
        Ok(self.submodules(store)?.get(path))
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.oid == other.oid
    }
}

impl Eq for Commit {}
