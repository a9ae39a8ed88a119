//! Git references (branches, HEAD, tags)
//!
//! References are human-readable names pointing to objects. They can be:
//! - Direct: containing a 40-character object id
//! - Symbolic: pointing to another reference (e.g., HEAD -> refs/heads/master)
//!
//! Loose refs live as files under the git directory; `packed-refs` holds
//! the ones that were packed. Loose refs shadow packed ones.

use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use file_guard::Lock;
use std::collections::BTreeMap;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;
use walkdir::WalkDir;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

static SYMREF: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(SYMREF_REGEX).expect("symref regex is valid"));

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";
pub const REFS_PREFIX: &str = "refs/";
pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";

/// Symbolic refs nest at most this deep before we give up
const MAX_SYMREF_DEPTH: usize = 5;

/// Parsed value of a single reference
#[derive(Debug, Clone, PartialEq)]
pub enum SymRefOrOid {
    /// Symbolic reference pointing to another ref
    SymRef(String),
    /// Direct object ID
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn parse(name: &str, content: &str) -> Result<SymRefOrOid> {
        let content = content.trim();

        if let Some(symref_match) = SYMREF.captures(content) {
            Ok(SymRefOrOid::SymRef(symref_match[1].to_string()))
        } else {
            ObjectId::try_parse(content)
                .map(SymRefOrOid::Oid)
                .map_err(|_| Error::InvalidRevision(format!("{name}: {content}")))
        }
    }
}

/// References manager rooted at the git directory
#[derive(Debug)]
pub struct Refs {
    path: Box<Path>,
}

impl Refs {
    pub fn new(path: Box<Path>) -> Self {
        Refs { path }
    }

    /// Read the value stored under a full ref name, without following it
    pub fn read(&self, name: &str) -> Result<Option<SymRefOrOid>> {
        let ref_path = self.path.join(name);
        if ref_path.is_file() {
            let content = std::fs::read_to_string(&ref_path)?;
            if content.trim().is_empty() {
                return Ok(None);
            }
            return SymRefOrOid::parse(name, &content).map(Some);
        }

        Ok(self.packed_refs()?.remove(name).map(SymRefOrOid::Oid))
    }

    /// Follow a full ref name (possibly symbolic) down to an object id
    pub fn read_oid(&self, name: &str) -> Result<Option<ObjectId>> {
        let mut current = name.to_string();

        for _ in 0..MAX_SYMREF_DEPTH {
            match self.read(&current)? {
                Some(SymRefOrOid::Oid(oid)) => return Ok(Some(oid)),
                Some(SymRefOrOid::SymRef(target)) => current = target,
                None => return Ok(None),
            }
        }

        Err(Error::InvalidRevision(format!("{name}: symbolic ref nesting too deep")))
    }

    /// Resolve a short or full name using git's lookup order
    ///
    /// `name`, `refs/name`, `refs/tags/name`, `refs/heads/name`,
    /// `refs/remotes/name`, `refs/remotes/name/HEAD`.
    pub fn resolve(&self, name: &str) -> Result<Option<ObjectId>> {
        let candidates = [
            name.to_string(),
            format!("{REFS_PREFIX}{name}"),
            format!("{TAGS_PREFIX}{name}"),
            format!("{HEADS_PREFIX}{name}"),
            format!("{REFS_PREFIX}remotes/{name}"),
            format!("{REFS_PREFIX}remotes/{name}/{HEAD_REF_NAME}"),
        ];

        for candidate in candidates {
            // only HEAD-like names may live directly in the git directory
            if !candidate.starts_with(REFS_PREFIX) && candidate != HEAD_REF_NAME {
                continue;
            }
            if let Some(oid) = self.read_oid(&candidate)? {
                trace!(name, candidate, %oid, "resolved ref");
                return Ok(Some(oid));
            }
        }

        Ok(None)
    }

    /// Full ref names starting with `prefix`, loose and packed, sorted
    pub fn list_refs(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names: BTreeMap<String, ()> = self
            .packed_refs()?
            .into_keys()
            .filter(|name| name.starts_with(prefix))
            .map(|name| (name, ()))
            .collect();

        let refs_path = self.path.join("refs");
        for entry in WalkDir::new(&refs_path).into_iter().filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative_path) = entry.path().strip_prefix(self.path.as_ref()) else {
                continue;
            };
            let name = relative_path
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if name.starts_with(prefix) {
                names.insert(name, ());
            }
        }

        Ok(names.into_keys().collect())
    }

    /// Write a raw ref value (an object id or `ref: <name>`) under an
    /// exclusive lock
    pub fn update_ref(&self, name: &str, raw_ref: &str) -> Result<()> {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        writeln!(lock.deref_mut(), "{raw_ref}")?;

        Ok(())
    }

    fn packed_refs(&self) -> Result<BTreeMap<String, ObjectId>> {
        let packed_path = self.path.join("packed-refs");
        if !packed_path.is_file() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&packed_path)?;
        let mut refs = BTreeMap::new();
        for line in content.lines() {
            // comments and peeled tag lines carry no ref names
            if line.starts_with('#') || line.starts_with('^') || line.trim().is_empty() {
                continue;
            }
            if let Some((oid, name)) = line.split_once(' ')
                && let Ok(oid) = ObjectId::try_parse(oid)
            {
                refs.insert(name.trim().to_string(), oid);
            }
        }

        Ok(refs)
    }
}
