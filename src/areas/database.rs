use crate::areas::store::{ObjectInfo, ObjectStream};
use crate::artifacts::objects::object::{frame_object, hash_object};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use fake::rand;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Loose object database (`.git/objects`)
///
/// Objects are zlib-compressed `<type> <size>\0<body>` records stored under
/// `xx/yyyy...`. Reads never take locks; writes go through a temp file and an
/// atomic rename, so concurrent readers only ever see complete objects.
#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

// TODO: read pack files so repositories that were gc'ed stay walkable
impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    /// Open an object for streaming; the header is consumed and returned
    pub fn open(&self, object_id: &ObjectId) -> Result<(ObjectInfo, ObjectStream)> {
        let object_path = self.path.join(object_id.to_path());
        trace!(oid = %object_id, "opening loose object");

        let file = match File::open(&object_path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::MissingObject(*object_id));
            }
            Err(err) => return Err(err.into()),
        };

        let decoder = flate2::bufread::ZlibDecoder::new(BufReader::new(file));
        let mut reader = BufReader::new(decoder);

        let (object_type, size) = ObjectType::parse_object_header(&mut reader)
            .map_err(|err| Error::corrupt(object_id, err))?;

        Ok((ObjectInfo::new(object_type, size), Box::new(reader)))
    }

    /// Write a record body unless an object with the same id already exists
    pub fn store(&self, object_type: ObjectType, body: &[u8]) -> Result<ObjectId> {
        let object_id = hash_object(object_type, body);
        let object_path = self.path.join(object_id.to_path());

        if !object_path.exists() {
            let object_dir = object_path
                .parent()
                .ok_or_else(|| Error::NotFound(object_path.display().to_string()))?;
            std::fs::create_dir_all(object_dir)?;

            self.write_object(object_dir, &object_path, &frame_object(object_type, body))?;
            trace!(oid = %object_id, %object_type, "stored loose object");
        }

        Ok(object_id)
    }

    fn write_object(&self, object_dir: &Path, object_path: &PathBuf, object_content: &[u8]) -> Result<()> {
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)?;
        file.write_all(&object_content)?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, object_path)?;

        Ok(())
    }

    fn compress(data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;

        Ok(encoder.finish()?)
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    /// Find all objects whose id starts with the given hex prefix
    ///
    /// For prefixes of 2+ characters only the matching fan-out directory is
    /// scanned.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        let mut matches = Vec::new();

        let dirs: Vec<String> = if prefix.len() >= 2 {
            vec![prefix[..2].to_string()]
        } else {
            (0..=255).map(|i| format!("{:02x}", i)).collect()
        };

        for dir_name in dirs {
            let dir_path = self.path.join(&dir_name);
            if !dir_path.is_dir() {
                continue;
            }

            for entry in std::fs::read_dir(&dir_path)? {
                let file_name = entry?.file_name();
                let full_oid = format!("{}{}", dir_name, file_name.to_string_lossy());

                if full_oid.starts_with(&prefix)
                    && let Ok(oid) = ObjectId::try_parse(&full_oid)
                {
                    matches.push(oid);
                }
            }
        }

        matches.sort();
        Ok(matches)
    }
}
