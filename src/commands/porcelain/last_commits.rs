use crate::areas::repository::Repository;
use crate::artifacts::log::last_commits::EntryCommitInfo;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// Print, for every entry of the directory `tree_path` at `revision`,
    /// the last commit that changed it
    pub async fn last_commits(&self, revision: &str, tree_path: &str, writer: &mut dyn Write) -> anyhow::Result<()> {
        let commit = self.commit(revision)?;
        let (tree, idx) = self.sub_tree(&commit, tree_path)?;
        let infos = self
            .entries_last_commits(&commit, tree_path, tree.entries(idx))
            .await?;

        for info in infos {
            let entry = info.entry();
            let last = info.commit();
            let name = if entry.is_dir() {
                format!("{}/", entry.name()).blue().bold().to_string()
            } else {
                entry.name().to_string()
            };

            write!(
                writer,
                "{} {} {name}",
                last.oid().to_short_oid().yellow(),
                last.committer().timestamp().format("%Y-%m-%d")
            )?;
            if let EntryCommitInfo::SubModule { file, .. } = &info {
                write!(writer, " @ {} {}", file.ref_id.to_short_oid(), file.url)?;
            }
            writeln!(writer, "\t{}", last.summary())?;
        }

        Ok(())
    }
}
