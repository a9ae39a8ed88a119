//! Decoded annotated tag record
//!
//! ```text
//! object <target-sha>
//! type <target-type>
//! tag <name>
//! tagger <signature>
//!
//! <tag message>
//! ```

use crate::artifacts::database::commit_record::split_headers;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TagRecord {
    pub object: ObjectId,
    pub object_type: ObjectType,
    pub name: String,
    pub tagger: Option<Signature>,
    pub message: String,
}

impl Packable for TagRecord {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut lines = vec![
            format!("object {}", self.object),
            format!("type {}", self.object_type),
            format!("tag {}", self.name),
        ];
        if let Some(tagger) = &self.tagger {
            lines.push(format!("tagger {}", tagger.display()));
        }
        lines.push(String::new());
        lines.push(self.message.to_string());

        Ok(Bytes::from(lines.join("\n")))
    }
}

impl Unpackable for TagRecord {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8_lossy(&content);
        let (headers, message) = split_headers(&content);

        let mut object = None;
        let mut object_type = None;
        let mut name = None;
        let mut tagger = None;

        for (key, value) in headers {
            match key {
                "object" => object = Some(ObjectId::try_parse(&value).context("Invalid tag object: invalid object line")?),
                "type" => object_type = Some(ObjectType::try_from(value.as_str())?),
                "tag" => name = Some(value),
                "tagger" => tagger = Some(Signature::try_from(value.as_str())?),
                _ => {}
            }
        }

        Ok(Self {
            object: object.context("Invalid tag object: missing object line")?,
            object_type: object_type.context("Invalid tag object: missing type line")?,
            name: name.context("Invalid tag object: missing tag line")?,
            tagger,
            message,
        })
    }
}

impl Object for TagRecord {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_annotated_tag() {
        let raw = "object 1111111111111111111111111111111111111111\ntype commit\ntag v1.0\n\
                   tagger Rel Eng <rel@example.com> 1700000000 +0000\n\nRelease 1.0\n";
        let record = TagRecord::deserialize(Cursor::new(raw.as_bytes().to_vec())).unwrap();

        assert_eq!(record.object_type, ObjectType::Commit);
        assert_eq!(record.name, "v1.0");
        assert_eq!(record.tagger.unwrap().name(), "Rel Eng");
        assert_eq!(record.message, "Release 1.0\n");
    }

    #[test]
    fn missing_type_is_rejected() {
        let raw = "object 1111111111111111111111111111111111111111\ntag v1\n\nmsg";
        assert!(TagRecord::deserialize(Cursor::new(raw.as_bytes().to_vec())).is_err());
    }
}
