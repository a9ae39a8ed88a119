use crate::areas::refs::TAGS_PREFIX;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::database::tag_record::TagRecord;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use anyhow::Context;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// List branches, marking the one HEAD is on
    pub fn list_branches(&self, writer: &mut dyn Write) -> anyhow::Result<()> {
        let head_branch = self.head_branch().ok();

        for branch in self.branches()? {
            if head_branch.as_deref() == Some(branch.as_str()) {
                writeln!(writer, "* {}", branch.green())?;
            } else {
                writeln!(writer, "  {branch}")?;
            }
        }

        Ok(())
    }

    pub fn set_head_branch(&self, name: &str, writer: &mut dyn Write) -> anyhow::Result<()> {
        if !self.is_branch_exist(name) {
            anyhow::bail!("branch '{name}' does not exist");
        }
        self.set_default_branch(name)?;
        writeln!(writer, "HEAD now points to {name}")?;

        Ok(())
    }

    /// List tags; with `verbose`, also the commit each one names and the
    /// annotation summary
    pub fn list_tags(&self, verbose: bool, writer: &mut dyn Write) -> anyhow::Result<()> {
        for name in self.tags()? {
            if !verbose {
                writeln!(writer, "{name}")?;
                continue;
            }

            let tag = self.tag(&name)?;
            let commit = tag.commit(self.store().as_ref())?;
            let summary = if tag.is_annotated() {
                tag.message().lines().next().unwrap_or_default()
            } else {
                commit.summary()
            };
            writeln!(writer, "{name:<15} {} {summary}", commit.oid().to_short_oid().yellow())?;
        }

        Ok(())
    }

    /// Create an annotated tag at `revision`, tagged by the identity in
    /// `GIT_AUTHOR_NAME`/`GIT_AUTHOR_EMAIL`
    pub fn create_annotated_tag(&self, name: &str, revision: &str, message: &str) -> anyhow::Result<()> {
        let name = BranchName::try_parse(name)?;
        if self.is_tag_exist(name.as_ref()) {
            anyhow::bail!("tag '{name}' already exists");
        }

        let commit = self.commit(revision)?;
        let tagger = Signature::load_from_env().context("an annotated tag needs a tagger identity")?;
        let mut message = message.trim_end().to_string();
        message.push('\n');

        let record = TagRecord::new(*commit.oid(), ObjectType::Commit, name.to_string(), Some(tagger), message);
        let oid = self.store().write_object(record.object_type(), &record.serialize()?)?;
        self.store().write_ref(&format!("{TAGS_PREFIX}{name}"), &oid.to_string())?;

        Ok(())
    }
}
