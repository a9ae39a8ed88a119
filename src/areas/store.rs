//! The object store contract consumed by the history engine
//!
//! Everything above this module (object model, walker, resolver) talks to
//! storage only through [`ObjectStore`]. [`DiskStore`] is the loose-object
//! implementation over a `.git` directory.

use crate::areas::database::Database;
use crate::areas::refs::{HEADS_PREFIX, Refs, SymRefOrOid, TAGS_PREFIX};
use crate::artifacts::database::commit_record::CommitRecord;
use crate::artifacts::database::database_entry::TreeRecord;
use crate::artifacts::database::tag_record::TagRecord;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use derive_new::new;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Body of an object, positioned right after its header
pub type ObjectStream = Box<dyn Read + Send>;

/// Object metadata available without reading the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct ObjectInfo {
    pub object_type: ObjectType,
    pub size: u64,
}

/// Content-addressed storage of objects and refs
///
/// Implementations must allow concurrent reads from many threads without
/// external locking.
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Open an object body; fails with [`Error::MissingObject`] if absent
    fn open_object(&self, oid: &ObjectId) -> Result<(ObjectType, ObjectStream)>;

    fn stat_object(&self, oid: &ObjectId) -> Result<ObjectInfo>;

    /// Store a record body and return its content address
    fn write_object(&self, object_type: ObjectType, body: &[u8]) -> Result<ObjectId>;

    /// Resolve a ref name (short or full, symbolic refs followed)
    fn resolve_ref(&self, name: &str) -> Result<ObjectId>;

    /// Full ref names starting with `prefix`, sorted
    fn list_refs(&self, prefix: &str) -> Result<Vec<String>>;

    /// Raw value of a ref: an object id or `ref: <target>`
    fn read_ref(&self, name: &str) -> Result<String>;

    fn write_ref(&self, name: &str, target: &str) -> Result<()>;

    fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>>;

    fn resolve_branch(&self, name: &str) -> Result<ObjectId> {
        self.resolve_ref(&format!("{HEADS_PREFIX}{name}"))
    }

    /// Resolve a tag ref and report the kind of object it names
    fn resolve_tag(&self, name: &str) -> Result<(ObjectId, ObjectType)> {
        let oid = self.resolve_ref(&format!("{TAGS_PREFIX}{name}"))?;
        let info = self.stat_object(&oid)?;

        Ok((oid, info.object_type))
    }

    fn open_commit(&self, oid: &ObjectId) -> Result<CommitRecord> {
        decode_record(self, oid, ObjectType::Commit)
    }

    fn open_tag(&self, oid: &ObjectId) -> Result<TagRecord> {
        decode_record(self, oid, ObjectType::Tag)
    }

    fn open_tree(&self, oid: &ObjectId) -> Result<TreeRecord> {
        decode_record(self, oid, ObjectType::Tree)
    }
}

fn decode_record<S, R>(store: &S, oid: &ObjectId, expected: ObjectType) -> Result<R>
where
    S: ObjectStore + ?Sized,
    R: Unpackable,
{
    let (object_type, stream) = store.open_object(oid)?;
    if object_type != expected {
        return Err(Error::InvalidTarget {
            name: oid.to_string(),
            kind: object_type,
            expected,
        });
    }

    R::deserialize(BufReader::new(stream)).map_err(|err| Error::corrupt(oid, err))
}

/// Loose-object store backed by a `.git` directory
#[derive(Debug)]
pub struct DiskStore {
    git_dir: Box<Path>,
    database: Database,
    refs: Refs,
}

impl DiskStore {
    /// Open the repository at `path`: either a work tree holding `.git` or a
    /// bare repository
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let git_dir = Self::discover(path).ok_or_else(|| Error::NotFound(path.display().to_string()))?;
        debug!(git_dir = %git_dir.display(), "opened repository");

        Ok(Self::at(git_dir))
    }

    /// Create an empty repository with `HEAD` pointing at `default_branch`
    pub fn init(path: impl AsRef<Path>, default_branch: &str) -> Result<Self> {
        let git_dir = path.as_ref().join(".git");
        std::fs::create_dir_all(git_dir.join("objects"))?;
        std::fs::create_dir_all(git_dir.join("refs").join("heads"))?;
        std::fs::create_dir_all(git_dir.join("refs").join("tags"))?;

        let store = Self::at(git_dir);
        store.write_ref("HEAD", &format!("ref: {HEADS_PREFIX}{default_branch}"))?;

        Ok(store)
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn at(git_dir: PathBuf) -> Self {
        DiskStore {
            database: Database::new(git_dir.join("objects").into_boxed_path()),
            refs: Refs::new(git_dir.clone().into_boxed_path()),
            git_dir: git_dir.into_boxed_path(),
        }
    }

    fn discover(path: &Path) -> Option<PathBuf> {
        let dot_git = path.join(".git");
        if dot_git.join("objects").is_dir() {
            return Some(dot_git);
        }

        if path.join("objects").is_dir() && path.join("HEAD").is_file() {
            return Some(path.to_path_buf());
        }

        None
    }
}

impl ObjectStore for DiskStore {
    fn open_object(&self, oid: &ObjectId) -> Result<(ObjectType, ObjectStream)> {
        let (info, stream) = self.database.open(oid)?;
        Ok((info.object_type, stream))
    }

    fn stat_object(&self, oid: &ObjectId) -> Result<ObjectInfo> {
        // only the header gets inflated, the stream is dropped unread
        let (info, _) = self.database.open(oid)?;
        Ok(info)
    }

    fn write_object(&self, object_type: ObjectType, body: &[u8]) -> Result<ObjectId> {
        self.database.store(object_type, body)
    }

    fn resolve_ref(&self, name: &str) -> Result<ObjectId> {
        self.refs
            .resolve(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<String>> {
        self.refs.list_refs(prefix)
    }

    fn read_ref(&self, name: &str) -> Result<String> {
        match self.refs.read(name)? {
            Some(SymRefOrOid::SymRef(target)) => Ok(format!("ref: {target}")),
            Some(SymRefOrOid::Oid(oid)) => Ok(oid.to_string()),
            None => Err(Error::NotFound(name.to_string())),
        }
    }

    fn write_ref(&self, name: &str, target: &str) -> Result<()> {
        self.refs.update_ref(name, target)
    }

    fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        self.database.find_objects_by_prefix(prefix)
    }
}
