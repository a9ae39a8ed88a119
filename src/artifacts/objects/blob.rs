//! Blob content
//!
//! Blobs store file content. They carry no metadata (name and mode live in
//! the tree entry that points to them), so a [`Blob`] is a tree entry viewed
//! as content.

use crate::areas::store::{ObjectStore, ObjectStream};
use crate::artifacts::objects::tree::TreeEntry;
use crate::errors::Result;
use bytes::Bytes;
use derive_new::new;
use std::io::Read;

/// How much of a blob is inspected when sniffing its content type
const SNIFF_LENGTH: u64 = 1024;

#[derive(Debug, Clone, new)]
pub struct Blob {
    entry: TreeEntry,
}

impl Blob {
    pub fn entry(&self) -> &TreeEntry {
        &self.entry
    }

    pub fn name(&self) -> &str {
        self.entry.name()
    }

    /// Stream the content without buffering it
    pub fn stream(&self, store: &dyn ObjectStore) -> Result<ObjectStream> {
        let (_, stream) = store.open_object(self.entry.oid())?;
        Ok(stream)
    }

    /// Read the whole content at once
    ///
    /// Slow and memory hungry for large blobs; prefer [`Blob::stream`].
    pub fn data(&self, store: &dyn ObjectStore) -> Result<Bytes> {
        let mut content = Vec::new();
        self.stream(store)?.read_to_end(&mut content)?;

        Ok(Bytes::from(content))
    }

    /// Whether the leading bytes carry a known image signature
    pub fn is_image(&self, store: &dyn ObjectStore) -> Result<bool> {
        let mut head = Vec::new();
        self.stream(store)?.take(SNIFF_LENGTH).read_to_end(&mut head)?;

        Ok(is_image_data(&head))
    }
}

/// Sniff common image formats from their magic numbers
pub fn is_image_data(data: &[u8]) -> bool {
    const SIGNATURES: [&[u8]; 7] = [
        b"\x89PNG\r\n\x1a\n",
        b"\xff\xd8\xff",
        b"GIF87a",
        b"GIF89a",
        b"BM",
        b"\x00\x00\x01\x00",
        b"\x00\x00\x02\x00",
    ];

    if SIGNATURES.iter().any(|signature| data.starts_with(signature)) {
        return true;
    }

    // RIFF container holding WebP
    data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP"
}
