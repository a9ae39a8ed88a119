//! Path relevance
//!
//! A commit is relevant to a path when the object at that path differs from
//! what every parent has there. A path missing from a snapshot counts as
//! absent, and going from absent to present (or back) is a change. Merges
//! that took the path unchanged from one of their parents are therefore not
//! relevant; the commit that actually changed it on the merged branch is.

use crate::areas::store::ObjectStore;
use crate::artifacts::log::visitor::Filter;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::TreeArena;
use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether a commit changed `path`, memoising the object found at
/// `path` per commit
#[derive(Debug)]
pub struct PathComparator {
    store: Arc<dyn ObjectStore>,
    path: String,
    resolved: HashMap<ObjectId, Option<ObjectId>>,
}

impl PathComparator {
    pub fn new(store: Arc<dyn ObjectStore>, path: impl Into<String>) -> Self {
        PathComparator {
            store,
            path: path.into(),
            resolved: HashMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Object at the path in the snapshot of `commit_oid`, `None` if absent
    fn resolve(&mut self, commit_oid: &ObjectId, tree_oid: Option<&ObjectId>) -> Result<Option<ObjectId>> {
        if let Some(resolved) = self.resolved.get(commit_oid) {
            return Ok(*resolved);
        }

        let tree_oid = match tree_oid {
            Some(tree_oid) => *tree_oid,
            None => *Commit::load(self.store.as_ref(), commit_oid)?.tree_oid(),
        };

        let mut arena = TreeArena::load(self.store.clone(), tree_oid)?;
        let resolved = match arena.resolve(arena.root(), &self.path) {
            Ok(entry) => Some(*entry.oid()),
            Err(Error::NotFound(_) | Error::NotADirectory(_)) => None,
            Err(err) => return Err(err),
        };
        self.resolved.insert(*commit_oid, resolved);

        Ok(resolved)
    }

    /// Whether `commit` changed the path relative to all of its parents
    ///
    /// A root commit changed the path iff the path exists in it.
    pub fn changed(&mut self, commit: &Commit) -> Result<bool> {
        let current = self.resolve(commit.oid(), Some(commit.tree_oid()))?;
        if commit.is_root() {
            return Ok(current.is_some());
        }

        for parent in commit.parents() {
            if self.resolve(parent, None)? == current {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl Filter for PathComparator {
    fn accepts(&mut self, commit: &Commit) -> Result<bool> {
        self.changed(commit)
    }
}

/// Filter accepting the commits that changed a path
#[derive(Debug)]
pub struct PathChecker {
    comparator: PathComparator,
}

impl PathChecker {
    pub fn new(store: Arc<dyn ObjectStore>, path: impl Into<String>) -> Self {
        PathChecker {
            comparator: PathComparator::new(store, path),
        }
    }

    pub fn path(&self) -> &str {
        self.comparator.path()
    }
}

impl Filter for PathChecker {
    fn accepts(&mut self, commit: &Commit) -> Result<bool> {
        self.comparator.changed(commit)
    }
}
