use crate::areas::refs::{HEADS_PREFIX, TAGS_PREFIX};
use crate::areas::repository::Repository;
use crate::artifacts::log::pager::Pager;
use crate::artifacts::log::path_filter::PathChecker;
use crate::artifacts::log::searcher::Searcher;
use crate::artifacts::log::visitor::Filter;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub revision: String,
    /// Only commits that changed at least one of these paths
    pub paths: Vec<String>,
    /// Only commits whose message contains this keyword, ignoring case
    pub grep: Option<String>,
    pub skip: usize,
    pub max_count: Option<usize>,
    pub oneline: bool,
    pub decorate: bool,
}

/// Accepts commits passing the keyword search and touching any of the paths
struct LogFilter {
    paths: Vec<PathChecker>,
    searcher: Option<Searcher>,
}

impl Filter for LogFilter {
    fn accepts(&mut self, commit: &Commit) -> crate::errors::Result<bool> {
        if let Some(searcher) = self.searcher.as_mut()
            && !searcher.accepts(commit)?
        {
            return Ok(false);
        }
        if self.paths.is_empty() {
            return Ok(true);
        }

        for path in self.paths.iter_mut() {
            if path.accepts(commit)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

impl Repository {
    pub fn log(&self, opts: &LogOptions, writer: &mut dyn Write) -> anyhow::Result<()> {
        let start = self.commit(&opts.revision)?;
        let filter = LogFilter {
            paths: opts
                .paths
                .iter()
                .map(|path| PathChecker::new(self.store().clone(), path.as_str()))
                .collect(),
            searcher: opts.grep.as_deref().map(Searcher::new),
        };
        let limit = opts.max_count.map_or(0, |count| i64::try_from(count).unwrap_or(i64::MAX));
        let offset = i64::try_from(opts.skip).unwrap_or(i64::MAX);

        let mut pager = Pager::new(filter, offset, limit);
        if opts.max_count != Some(0) {
            self.walk(start.oid(), &mut pager)?;
        }

        let decorations = if opts.decorate {
            self.reverse_refs()?
        } else {
            HashMap::new()
        };

        for (i, commit) in pager.commits().iter().enumerate() {
            let decoration = decorations
                .get(commit.oid())
                .map(|names| format!(" ({})", names.join(", ")))
                .unwrap_or_default();

            if opts.oneline {
                writeln!(
                    writer,
                    "{}{decoration} {}",
                    commit.oid().to_short_oid().yellow(),
                    commit.summary()
                )?;
            } else {
                if i > 0 {
                    writeln!(writer)?;
                }
                self.show_commit_medium(commit, &decoration, writer)?;
            }
        }

        Ok(())
    }

    fn show_commit_medium(&self, commit: &Commit, decoration: &str, writer: &mut dyn Write) -> anyhow::Result<()> {
        writeln!(writer, "{}{decoration}", format!("commit {}", commit.oid()).yellow())?;
        if commit.is_merge() {
            let parents = commit
                .parents()
                .iter()
                .map(ObjectId::to_short_oid)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "Merge: {parents}")?;
        }
        writeln!(writer, "Author: {}", commit.author().display_name())?;
        writeln!(writer, "Date:   {}", commit.author().readable_timestamp())?;
        writeln!(writer)?;
        for message_line in commit.message().lines() {
            writeln!(writer, "    {message_line}")?;
        }

        Ok(())
    }

    /// Ref names by the commit they point to, HEAD's branch first
    fn reverse_refs(&self) -> anyhow::Result<HashMap<ObjectId, Vec<String>>> {
        let head_branch = self.head_branch().ok();
        let mut reverse_refs: HashMap<ObjectId, Vec<String>> = HashMap::new();

        for branch in self.branches()? {
            let oid = self.store().resolve_ref(&format!("{HEADS_PREFIX}{branch}"))?;
            let names = reverse_refs.entry(oid).or_default();
            if head_branch.as_deref() == Some(branch.as_str()) {
                names.insert(0, format!("{} -> {}", "HEAD".cyan().bold(), branch.green().bold()));
            } else {
                names.push(branch.green().bold().to_string());
            }
        }

        for tag in self.tags()? {
            let oid = self.store().resolve_ref(&format!("{TAGS_PREFIX}{tag}"))?;
            let commit = self.peel_to_commit(&oid)?;
            reverse_refs
                .entry(*commit.oid())
                .or_default()
                .push(format!("tag: {tag}").yellow().bold().to_string());
        }

        Ok(reverse_refs)
    }
}
