use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::BufRead;

/// Encodes a record body (everything after the `<type> <size>\0` header)
pub trait Packable {
    fn serialize(&self) -> anyhow::Result<Bytes>;
}

/// Decodes a record body; the header has already been consumed
pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn object_id(&self) -> anyhow::Result<ObjectId> {
        Ok(hash_object(self.object_type(), &self.serialize()?))
    }
}

/// Prefix a record body with its `<type> <size>\0` header
pub fn frame_object(object_type: ObjectType, body: &[u8]) -> Bytes {
    let mut framed = format!("{} {}\0", object_type.as_str(), body.len()).into_bytes();
    framed.extend_from_slice(body);
    Bytes::from(framed)
}

/// Content address of a record body of the given type
pub fn hash_object(object_type: ObjectType, body: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(frame_object(object_type, body));
    let digest: [u8; 20] = hasher.finalize().into();

    ObjectId::from(digest)
}
