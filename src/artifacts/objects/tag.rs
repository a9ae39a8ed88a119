//! Tags
//!
//! A lightweight tag is just a ref under `refs/tags/` naming a commit. An
//! annotated tag ref names a tag object, which carries a tagger and a
//! message and points to a commit or to another tag.

use crate::areas::store::ObjectStore;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    oid: ObjectId,
    name: String,
    target: ObjectId,
    target_type: ObjectType,
    tagger: Option<Signature>,
    message: String,
}

impl Tag {
    /// Build the tag a `refs/tags/<name>` ref points to
    ///
    /// # Arguments
    ///
    /// * `name` - short tag name
    /// * `oid` - the object the ref names
    /// * `object_type` - kind of that object
    pub fn load(store: &dyn ObjectStore, name: &str, oid: ObjectId, object_type: ObjectType) -> Result<Self> {
        match object_type {
            ObjectType::Tag => {
                let record = store.open_tag(&oid)?;
                Ok(Tag {
                    oid,
                    name: name.to_string(),
                    target: record.object,
                    target_type: record.object_type,
                    tagger: record.tagger,
                    message: record.message,
                })
            }
            ObjectType::Commit => Ok(Tag {
                oid,
                name: name.to_string(),
                target: oid,
                target_type: ObjectType::Commit,
                tagger: None,
                message: String::new(),
            }),
            kind => Err(Error::InvalidTarget {
                name: name.to_string(),
                kind,
                expected: ObjectType::Commit,
            }),
        }
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    /// `None` for lightweight tags
    pub fn tagger(&self) -> Option<&Signature> {
        self.tagger.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_annotated(&self) -> bool {
        self.oid != self.target
    }

    /// Follow the tag chain down to the tagged commit
    pub fn commit(&self, store: &dyn ObjectStore) -> Result<Commit> {
        let mut target = self.target;
        let mut target_type = self.target_type;

        loop {
            match target_type {
                ObjectType::Commit => return Commit::load(store, &target),
                ObjectType::Tag => {
                    let record = store.open_tag(&target)?;
                    target = record.object;
                    target_type = record.object_type;
                }
                kind => {
                    return Err(Error::InvalidTarget {
                        name: self.name.clone(),
                        kind,
                        expected: ObjectType::Commit,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRepo;
    use pretty_assertions::assert_eq;

    #[test]
    fn lightweight_tag_names_the_commit() {
        let repo = TestRepo::new();
        let commit = repo.commit(repo.snapshot(&[("a", "a")]), &[], 1, "c");
        let store = repo.store();

        let tag = Tag::load(store.as_ref(), "v1", commit, ObjectType::Commit).unwrap();
        assert!(!tag.is_annotated());
        assert!(tag.tagger().is_none());
        assert_eq!(tag.commit(store.as_ref()).unwrap().oid(), &commit);
    }

    #[test]
    fn follows_nested_annotated_tags() {
        let repo = TestRepo::new();
        let commit = repo.commit(repo.snapshot(&[("a", "a")]), &[], 1, "c");
        let inner = repo.annotated_tag("inner", commit, ObjectType::Commit);
        let outer = repo.annotated_tag("outer", inner, ObjectType::Tag);
        let store = repo.store();

        let tag = Tag::load(store.as_ref(), "outer", outer, ObjectType::Tag).unwrap();
        assert!(tag.is_annotated());
        assert_eq!(tag.target_type(), ObjectType::Tag);
        assert_eq!(tag.message(), "release outer\n");
        assert_eq!(tag.commit(store.as_ref()).unwrap().oid(), &commit);
    }

    #[test]
    fn tag_of_a_blob_is_an_invalid_target() {
        let repo = TestRepo::new();
        let blob = repo.blob("data");
        let tag_oid = repo.annotated_tag("blob-tag", blob, ObjectType::Blob);
        let store = repo.store();

        let tag = Tag::load(store.as_ref(), "blob-tag", tag_oid, ObjectType::Tag).unwrap();
        assert!(matches!(
            tag.commit(store.as_ref()),
            Err(Error::InvalidTarget { kind: ObjectType::Blob, .. })
        ));
        assert!(Tag::load(store.as_ref(), "raw", blob, ObjectType::Blob).is_err());
    }
}
