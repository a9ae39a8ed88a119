use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    /// Print how many commits are reachable from `revision`, or per path how
    /// many of them changed it
    pub fn count(&self, revision: &str, paths: &[String], writer: &mut dyn Write) -> anyhow::Result<()> {
        match paths {
            [] => {
                let start = self.commit(revision)?;
                writeln!(writer, "{}", self.commits_count(start.oid())?)?;
            }
            [path] => writeln!(writer, "{}", self.file_commits_count(revision, path)?)?,
            paths => {
                let start = self.commit(revision)?;
                let paths = paths.iter().map(String::as_str).collect::<Vec<_>>();
                let counts = self.file_commits_counts(start.oid(), &paths)?;
                for (path, count) in paths.iter().zip(counts) {
                    writeln!(writer, "{count}\t{path}")?;
                }
            }
        }

        Ok(())
    }
}
