//! Decoded tree record
//!
//! Each entry on disk: `<mode> <name>\0<20-byte-sha1>`. The record keeps the
//! raw entries in stored order; canonical ordering for display is applied by
//! the object model.

use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::cmp::Ordering;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, new)]
pub struct DatabaseEntry {
    pub name: String,
    pub oid: ObjectId,
    pub mode: EntryMode,
}

impl DatabaseEntry {
    pub fn is_tree(&self) -> bool {
        self.mode.is_tree()
    }

    /// Order used inside stored tree records: trees compare as if their
    /// name ended with `/`
    fn storage_cmp(&self, other: &Self) -> Ordering {
        let key = |entry: &Self| {
            let mut key = entry.name.as_bytes().to_vec();
            if entry.is_tree() {
                key.push(b'/');
            }
            key
        };

        key(self).cmp(&key(other))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeRecord {
    entries: Vec<DatabaseEntry>,
}

impl TreeRecord {
    /// Build a record for writing; entries are put into storage order
    pub fn new(mut entries: Vec<DatabaseEntry>) -> Self {
        entries.sort_by(DatabaseEntry::storage_cmp);
        Self { entries }
    }

    pub fn entries(&self) -> &[DatabaseEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DatabaseEntry> {
        self.entries
    }

    pub fn find(&self, name: &str) -> Option<&DatabaseEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

impl Packable for TreeRecord {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content = Vec::new();

        for entry in &self.entries {
            write!(content, "{:o} {}", entry.mode.as_u32(), entry.name)?;
            content.push(0);
            entry.oid.write_h40_to(&mut content)?;
        }

        Ok(Bytes::from(content))
    }
}

impl Unpackable for TreeRecord {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = Vec::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                anyhow::bail!("unexpected EOF in mode");
            }

            let mode = EntryMode::from_octal_str(std::str::from_utf8(&mode_bytes)?)?;

            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                anyhow::bail!("unexpected EOF in name");
            }
            let name = String::from_utf8(name_bytes.clone()).context("tree entry name is not UTF-8")?;

            let oid = ObjectId::read_h40_from(&mut reader).context("unexpected EOF in object id")?;

            entries.push(DatabaseEntry::new(name, oid, mode));
        }

        Ok(TreeRecord { entries })
    }
}

impl Object for TreeRecord {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}
