use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::{TreeArena, TreeIdx};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct LsTreeOptions {
    /// Descend into subdirectories, listing files only
    pub recursive: bool,
    /// Show the size of blobs
    pub long: bool,
}

impl Repository {
    /// List a tree; commits and `<revision>:<dir>` specs name their tree
    pub fn ls_tree(&self, tree_ish: &str, opts: LsTreeOptions, writer: &mut dyn Write) -> anyhow::Result<()> {
        let oid = self.resolve_object(tree_ish)?;
        let tree_oid = match self.store().stat_object(&oid)?.object_type {
            ObjectType::Commit => *self.load_commit(&oid)?.tree_oid(),
            ObjectType::Tree => oid,
            kind => anyhow::bail!("{tree_ish} is a {kind}, not a tree"),
        };

        let mut tree = self.tree(&tree_oid)?;
        let root = tree.root();
        self.list_tree(&mut tree, root, opts, writer)
    }

    fn list_tree(
        &self,
        tree: &mut TreeArena,
        idx: TreeIdx,
        opts: LsTreeOptions,
        writer: &mut dyn Write,
    ) -> anyhow::Result<()> {
        for entry in tree.entries(idx).to_vec() {
            if opts.recursive && entry.is_dir() {
                let child = tree.sub_tree(idx, entry.name())?;
                self.list_tree(tree, child, opts, writer)?;
                continue;
            }

            let path = tree.entry_path(&entry);
            if opts.long {
                let size = if entry.is_blob() {
                    entry.size(self.store().as_ref())?.to_string()
                } else {
                    "-".to_string()
                };
                writeln!(
                    writer,
                    "{} {} {} {size:>7}\t{path}",
                    entry.mode().as_str(),
                    entry.mode().object_type(),
                    entry.oid()
                )?;
            } else {
                writeln!(
                    writer,
                    "{} {} {}\t{path}",
                    entry.mode().as_str(),
                    entry.mode().object_type(),
                    entry.oid()
                )?;
            }
        }

        Ok(())
    }
}
