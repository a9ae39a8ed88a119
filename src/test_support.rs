//! Repository builders for unit tests

use crate::areas::store::{DiskStore, ObjectStore};
use crate::artifacts::database::commit_record::CommitRecord;
use crate::artifacts::database::database_entry::{DatabaseEntry, TreeRecord};
use crate::artifacts::database::tag_record::TagRecord;
use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object::Packable;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use assert_fs::TempDir;
use chrono::DateTime;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

enum Node {
    File(String),
    Dir(BTreeMap<String, Node>),
}

pub(crate) struct TestRepo {
    dir: TempDir,
    store: Arc<dyn ObjectStore>,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::init(dir.path(), "main").unwrap();

        TestRepo {
            dir,
            store: Arc::new(store),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    pub fn blob(&self, content: &str) -> ObjectId {
        self.store.write_object(ObjectType::Blob, content.as_bytes()).unwrap()
    }

    pub fn tree(&self, entries: Vec<DatabaseEntry>) -> ObjectId {
        let record = TreeRecord::new(entries);
        self.store
            .write_object(ObjectType::Tree, &record.serialize().unwrap())
            .unwrap()
    }

    /// Write nested trees holding `(path, content)` files
    pub fn snapshot(&self, files: &[(&str, &str)]) -> ObjectId {
        let mut root = BTreeMap::new();
        for (path, content) in files {
            let mut dir = &mut root;
            let segments = path.split('/').collect::<Vec<_>>();
            let (file, dirs) = segments.split_last().unwrap();
            for segment in dirs {
                let node = dir
                    .entry(segment.to_string())
                    .or_insert_with(|| Node::Dir(BTreeMap::new()));
                dir = match node {
                    Node::Dir(children) => children,
                    Node::File(_) => panic!("{segment} is both a file and a directory"),
                };
            }
            dir.insert(file.to_string(), Node::File(content.to_string()));
        }

        self.write_dir(&root)
    }

    fn write_dir(&self, children: &BTreeMap<String, Node>) -> ObjectId {
        let entries = children
            .iter()
            .map(|(name, node)| match node {
                Node::File(content) => {
                    DatabaseEntry::new(name.clone(), self.blob(content), EntryMode::File(FileMode::Regular))
                }
                Node::Dir(grandchildren) => {
                    DatabaseEntry::new(name.clone(), self.write_dir(grandchildren), EntryMode::Directory)
                }
            })
            .collect();

        self.tree(entries)
    }

    pub fn signature(time: i64) -> Signature {
        let timestamp = DateTime::from_timestamp(time, 0).unwrap().fixed_offset();
        Signature::new_with_timestamp("A U Thor".to_string(), "author@example.com".to_string(), timestamp)
    }

    pub fn commit(&self, tree: ObjectId, parents: &[ObjectId], time: i64, message: &str) -> ObjectId {
        let signature = Self::signature(time);
        let record = CommitRecord::new(tree, parents.to_vec(), signature.clone(), signature, message.to_string());

        self.store
            .write_object(ObjectType::Commit, &record.serialize().unwrap())
            .unwrap()
    }

    pub fn annotated_tag(&self, name: &str, target: ObjectId, target_type: ObjectType) -> ObjectId {
        let record = TagRecord::new(
            target,
            target_type,
            name.to_string(),
            Some(Self::signature(1)),
            format!("release {name}\n"),
        );

        self.store
            .write_object(ObjectType::Tag, &record.serialize().unwrap())
            .unwrap()
    }

    pub fn set_ref(&self, name: &str, oid: ObjectId) {
        self.store.write_ref(name, &oid.to_string()).unwrap();
    }
}
