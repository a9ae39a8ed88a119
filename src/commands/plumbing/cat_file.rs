use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatFileMode {
    /// Pretty-print the content
    Pretty,
    /// Print the object type
    Type,
    /// Print the content size in bytes
    Size,
}

impl Repository {
    pub fn cat_file(&self, object: &str, mode: CatFileMode, writer: &mut dyn Write) -> anyhow::Result<()> {
        let oid = self.resolve_object(object)?;

        match mode {
            CatFileMode::Type => writeln!(writer, "{}", self.store().stat_object(&oid)?.object_type)?,
            CatFileMode::Size => writeln!(writer, "{}", self.store().stat_object(&oid)?.size)?,
            CatFileMode::Pretty => {
                let (object_type, mut stream) = self.store().open_object(&oid)?;
                if object_type == ObjectType::Tree {
                    let tree = self.tree(&oid)?;
                    for entry in tree.entries(tree.root()) {
                        writeln!(
                            writer,
                            "{} {} {}\t{}",
                            entry.mode().as_str(),
                            entry.mode().object_type(),
                            entry.oid(),
                            entry.name()
                        )?;
                    }
                } else {
                    std::io::copy(&mut stream, writer)?;
                }
            }
        }

        Ok(())
    }
}
