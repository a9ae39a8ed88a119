//! Decoded commit record
//!
//! ```text
//! tree <tree-sha>
//! parent <parent-sha>        (zero or more)
//! author <signature>
//! committer <signature>
//! <other headers>            (gpgsig, encoding, mergetag, ...)
//!
//! <commit message>
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct CommitRecord {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

/// Split a record into `(key, value)` headers and the trailing message
///
/// Continuation lines (starting with a space) are folded into the previous
/// header's value, which is how multi-line `gpgsig` blocks are stored.
pub(crate) fn split_headers(content: &str) -> (Vec<(&str, String)>, String) {
    let (head, message) = match content.split_once("\n\n") {
        Some((head, message)) => (head, message.to_string()),
        None => (content.trim_end_matches('\n'), String::new()),
    };

    let mut headers: Vec<(&str, String)> = Vec::new();
    for line in head.lines() {
        if let Some(continuation) = line.strip_prefix(' ') {
            if let Some((_, value)) = headers.last_mut() {
                value.push('\n');
                value.push_str(continuation);
            }
            continue;
        }

        match line.split_once(' ') {
            Some((key, value)) => headers.push((key, value.to_string())),
            None => headers.push((line, String::new())),
        }
    }

    (headers, message)
}

impl Packable for CommitRecord {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut lines = vec![format!("tree {}", self.tree)];
        for parent in &self.parents {
            lines.push(format!("parent {}", parent));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(format!("committer {}", self.committer.display()));
        lines.push(String::new());
        lines.push(self.message.to_string());

        Ok(Bytes::from(lines.join("\n")))
    }
}

impl Unpackable for CommitRecord {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8_lossy(&content);
        let (headers, message) = split_headers(&content);

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for (key, value) in headers {
            match key {
                "tree" => tree = Some(ObjectId::try_parse(&value).context("Invalid commit object: invalid tree line")?),
                "parent" => parents.push(
                    ObjectId::try_parse(&value).context("Invalid commit object: invalid parent line")?,
                ),
                "author" => author = Some(Signature::try_from(value.as_str())?),
                "committer" => committer = Some(Signature::try_from(value.as_str())?),
                _ => {}
            }
        }

        let author = author.context("Invalid commit object: missing author line")?;
        Ok(Self {
            tree: tree.context("Invalid commit object: missing tree line")?,
            parents,
            committer: committer.unwrap_or_else(|| author.clone()),
            author,
            message,
        })
    }
}

impl Object for CommitRecord {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
    const PARENT_A: &str = "1111111111111111111111111111111111111111";
    const PARENT_B: &str = "2222222222222222222222222222222222222222";

    #[test]
    fn decodes_merge_commit_with_signature_block() {
        let raw = format!(
            "tree {TREE}\nparent {PARENT_A}\nparent {PARENT_B}\n\
             author A U Thor <author@example.com> 1700000000 +0000\n\
             committer C O Mitter <committer@example.com> 1700000100 +0200\n\
             gpgsig -----BEGIN PGP SIGNATURE-----\n \n abcdef\n -----END PGP SIGNATURE-----\n\
             \nMerge branch 'topic'\n\nDetails here.\n"
        );

        let record = CommitRecord::deserialize(Cursor::new(raw.into_bytes())).unwrap();

        assert_eq!(record.tree, TREE);
        assert_eq!(record.parents.len(), 2);
        assert_eq!(record.parents[1], PARENT_B);
        assert_eq!(record.author.name(), "A U Thor");
        assert_eq!(record.committer.email(), "committer@example.com");
        assert_eq!(record.message, "Merge branch 'topic'\n\nDetails here.\n");
    }

    #[test]
    fn root_commit_has_no_parents() {
        let raw = format!(
            "tree {TREE}\nauthor a <a@b> 1 +0000\ncommitter a <a@b> 1 +0000\n\ninitial"
        );
        let record = CommitRecord::deserialize(Cursor::new(raw.into_bytes())).unwrap();

        assert!(record.parents.is_empty());
        assert_eq!(record.message, "initial");
    }

    #[test]
    fn missing_tree_is_rejected() {
        let raw = "author a <a@b> 1 +0000\n\nno tree";
        assert!(CommitRecord::deserialize(Cursor::new(raw.as_bytes().to_vec())).is_err());
    }

    #[test]
    fn decodes_what_it_encodes() {
        let signature = Signature::try_from("a <a@b> 1700000000 +0000").unwrap();
        let record = CommitRecord::new(
            ObjectId::try_parse(TREE).unwrap(),
            vec![ObjectId::try_parse(PARENT_A).unwrap()],
            signature.clone(),
            signature,
            "message\n".to_string(),
        );

        let bytes = record.serialize().unwrap();
        let decoded = CommitRecord::deserialize(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(decoded, record);
    }
}
