//! Plumbing commands
//!
//! ## Commands
//!
//! - `cat-file`: Print the type, size or content of an object
//! - `ls-tree`: List contents of a tree object

use crate::areas::repository::Repository;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;

pub mod cat_file;
pub mod ls_tree;

impl Repository {
    /// Resolve `<revision>`, `<revision>:<path>` or a full object id
    pub fn resolve_object(&self, spec: &str) -> anyhow::Result<ObjectId> {
        if let Some((revision, path)) = spec.split_once(':') {
            let revision = if revision.is_empty() { "HEAD" } else { revision };
            let commit = self.commit(revision)?;
            let entry = self
                .tree_entry_by_path(&commit, path)
                .with_context(|| format!("path '{path}' does not exist in '{revision}'"))?;

            return Ok(*entry.oid());
        }

        if spec.len() == OBJECT_ID_LENGTH
            && let Ok(oid) = ObjectId::try_parse(spec)
            && self.store().stat_object(&oid).is_ok()
        {
            return Ok(oid);
        }

        Ok(*self
            .commit(spec)
            .with_context(|| format!("not a valid object name {spec}"))?
            .oid())
    }
}
