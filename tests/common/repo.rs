use assert_fs::TempDir;
use chrono::DateTime;
use lineage::areas::repository::Repository;
use lineage::artifacts::database::commit_record::CommitRecord;
use lineage::artifacts::database::database_entry::{DatabaseEntry, TreeRecord};
use lineage::artifacts::objects::entry_mode::{EntryMode, FileMode};
use lineage::artifacts::objects::object::Packable;
use lineage::artifacts::objects::object_id::ObjectId;
use lineage::artifacts::objects::object_type::ObjectType;
use lineage::artifacts::objects::signature::Signature;
use lineage::config::Config;
use rstest::fixture;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A file of a snapshot; submodules pin a commit of another repository
pub enum Content<'a> {
    File(&'a str),
    SubModule(ObjectId),
}

enum Node {
    Leaf(EntryMode, ObjectId),
    Dir(BTreeMap<String, Node>),
}

/// Writes objects and refs straight into a fresh repository
pub struct RepoBuilder {
    dir: TempDir,
    repository: Repository,
}

#[fixture]
pub fn repo() -> RepoBuilder {
    RepoBuilder::new()
}

impl RepoBuilder {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repository = Repository::init(dir.path(), "main").expect("Failed to init repository");

        RepoBuilder { dir, repository }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Reopen with explicit settings
    pub fn open(&self, config: Config) -> Repository {
        Repository::open_with_config(self.path(), config).expect("Failed to open repository")
    }

    pub fn blob(&self, content: &str) -> ObjectId {
        self.repository
            .store()
            .write_object(ObjectType::Blob, content.as_bytes())
            .expect("Failed to write blob")
    }

    /// Write nested trees holding `(path, content)` files
    pub fn snapshot(&self, files: &[(&str, &str)]) -> ObjectId {
        let files = files
            .iter()
            .map(|(path, content)| (*path, Content::File(content)))
            .collect::<Vec<_>>();
        self.snapshot_with(&files)
    }

    pub fn snapshot_with(&self, files: &[(&str, Content)]) -> ObjectId {
        let mut root = BTreeMap::new();
        for (path, content) in files {
            let leaf = match content {
                Content::File(text) => Node::Leaf(EntryMode::File(FileMode::Regular), self.blob(text)),
                Content::SubModule(oid) => Node::Leaf(EntryMode::Submodule, *oid),
            };

            let segments = path.split('/').collect::<Vec<_>>();
            let (name, dirs) = segments.split_last().expect("empty path");
            let mut dir = &mut root;
            for segment in dirs {
                let node = dir
                    .entry(segment.to_string())
                    .or_insert_with(|| Node::Dir(BTreeMap::new()));
                dir = match node {
                    Node::Dir(children) => children,
                    Node::Leaf(..) => panic!("{segment} is both a file and a directory"),
                };
            }
            dir.insert(name.to_string(), leaf);
        }

        self.write_dir(&root)
    }

    fn write_dir(&self, children: &BTreeMap<String, Node>) -> ObjectId {
        let entries = children
            .iter()
            .map(|(name, node)| match node {
                Node::Leaf(mode, oid) => DatabaseEntry::new(name.clone(), *oid, *mode),
                Node::Dir(grandchildren) => {
                    DatabaseEntry::new(name.clone(), self.write_dir(grandchildren), EntryMode::Directory)
                }
            })
            .collect();

        let record = TreeRecord::new(entries);
        self.repository
            .store()
            .write_object(ObjectType::Tree, &record.serialize().expect("Failed to serialize tree"))
            .expect("Failed to write tree")
    }

    pub fn signature(time: i64) -> Signature {
        let timestamp = DateTime::from_timestamp(time, 0)
            .expect("timestamp out of range")
            .fixed_offset();
        Signature::new_with_timestamp("A U Thor".to_string(), "author@example.com".to_string(), timestamp)
    }

    pub fn commit(&self, tree: ObjectId, parents: &[ObjectId], time: i64, message: &str) -> ObjectId {
        let signature = Self::signature(time);
        let record = CommitRecord::new(tree, parents.to_vec(), signature.clone(), signature, format!("{message}\n"));

        self.repository
            .store()
            .write_object(ObjectType::Commit, &record.serialize().expect("Failed to serialize commit"))
            .expect("Failed to write commit")
    }

    pub fn set_branch(&self, name: &str, oid: ObjectId) {
        self.repository
            .store()
            .write_ref(&format!("refs/heads/{name}"), &oid.to_string())
            .expect("Failed to write ref");
    }

    /// Location of a loose object on disk
    pub fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.path().join(".git").join("objects").join(oid.to_path())
    }
}
