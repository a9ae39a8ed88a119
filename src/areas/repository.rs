//! Host API over a repository
//!
//! `Repository` ties the object store, name resolution and the history
//! engine together. History queries start at a commit and run one walk with
//! the visitor that computes the answer.

use crate::areas::refs::{HEAD_REF_NAME, HEADS_PREFIX, TAGS_PREFIX};
use crate::areas::store::{DiskStore, ObjectStore};
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::log::counter::Counter;
use crate::artifacts::log::last_commits::{EntryCommitInfo, LastCommits};
use crate::artifacts::log::pager::Pager;
use crate::artifacts::log::path_filter::PathChecker;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::log::searcher::Searcher;
use crate::artifacts::log::visitor::{AcceptAll, Chain, Filter, Visitor};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::{TreeArena, TreeEntry, TreeIdx};
use crate::config::Config;
use crate::errors::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Repository {
    path: Box<Path>,
    store: Arc<dyn ObjectStore>,
    config: Config,
}

impl Repository {
    /// Open the repository at `path` (a work tree holding `.git`, or a bare
    /// repository) with settings from the environment
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, Config::load_from_env())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let store = DiskStore::open(path.as_ref())?;
        debug!(git_dir = %store.git_dir().display(), "opened repository");

        Ok(Self::with_store(path, Arc::new(store), config))
    }

    /// Create an empty repository whose HEAD points to `default_branch`
    pub fn init(path: impl AsRef<Path>, default_branch: &str) -> Result<Self> {
        BranchName::try_parse(default_branch)?;
        let store = DiskStore::init(path.as_ref(), default_branch)?;

        Ok(Self::with_store(path, Arc::new(store), Config::load_from_env()))
    }

    pub fn with_store(path: impl AsRef<Path>, store: Arc<dyn ObjectStore>, config: Config) -> Self {
        Repository {
            path: path.as_ref().into(),
            store,
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // names

    /// Resolve a revision expression (`HEAD`, `@`, branch, tag, `refs/...`,
    /// full or abbreviated object id, `rev^`, `rev~n`) to its commit
    pub fn commit(&self, revision: &str) -> Result<Commit> {
        let oid = Revision::try_parse(revision)?.resolve(self)?;
        self.load_commit(&oid)
    }

    pub fn load_commit(&self, oid: &ObjectId) -> Result<Commit> {
        Commit::load(self.store.as_ref(), oid)
    }

    /// Follow tags until a commit is reached
    pub fn peel_to_commit(&self, oid: &ObjectId) -> Result<Commit> {
        match self.store.stat_object(oid)?.object_type {
            ObjectType::Commit => self.load_commit(oid),
            ObjectType::Tag => Tag::load(self.store.as_ref(), &oid.to_string(), *oid, ObjectType::Tag)?
                .commit(self.store.as_ref()),
            kind => Err(Error::InvalidTarget {
                name: oid.to_string(),
                kind,
                expected: ObjectType::Commit,
            }),
        }
    }

    pub fn branch_commit(&self, name: &str) -> Result<Commit> {
        let oid = self.store.resolve_branch(name)?;
        self.load_commit(&oid)
    }

    pub fn tag_commit(&self, name: &str) -> Result<Commit> {
        self.tag(name)?.commit(self.store.as_ref())
    }

    pub fn head_commit(&self) -> Result<Commit> {
        let oid = self.store.resolve_ref(HEAD_REF_NAME)?;
        self.peel_to_commit(&oid)
    }

    /// Short name of the branch HEAD points to
    pub fn head_branch(&self) -> Result<String> {
        let head = self.store.read_ref(HEAD_REF_NAME)?;

        head.strip_prefix("ref: ")
            .and_then(|target| target.strip_prefix(HEADS_PREFIX))
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidRevision(format!("HEAD is not on a branch: {head}")))
    }

    pub fn branches(&self) -> Result<Vec<String>> {
        self.short_ref_names(HEADS_PREFIX)
    }

    pub fn tags(&self) -> Result<Vec<String>> {
        self.short_ref_names(TAGS_PREFIX)
    }

    pub fn tag(&self, name: &str) -> Result<Tag> {
        let (oid, object_type) = self.store.resolve_tag(name)?;
        Tag::load(self.store.as_ref(), name, oid, object_type)
    }

    /// Create a lightweight tag named `name` at `revision`
    pub fn create_tag(&self, name: &str, revision: &str) -> Result<()> {
        let name = BranchName::try_parse(name)?;
        if self.is_tag_exist(name.as_ref()) {
            return Err(Error::InvalidRevision(format!("tag '{name}' already exists")));
        }

        let commit = self.commit(revision)?;
        self.store
            .write_ref(&format!("{TAGS_PREFIX}{name}"), &commit.oid().to_string())
    }

    /// Point HEAD at the branch `name`
    pub fn set_default_branch(&self, name: &str) -> Result<()> {
        let name = BranchName::try_parse(name)?;
        self.store
            .write_ref(HEAD_REF_NAME, &format!("ref: {HEADS_PREFIX}{name}"))
    }

    pub fn is_branch_exist(&self, name: &str) -> bool {
        self.store.resolve_branch(name).is_ok()
    }

    pub fn is_tag_exist(&self, name: &str) -> bool {
        self.store.read_ref(&format!("{TAGS_PREFIX}{name}")).is_ok()
    }

    pub fn is_reference_exist(&self, name: &str) -> bool {
        self.store.read_ref(name).is_ok()
    }

    fn short_ref_names(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .list_refs(prefix)?
            .into_iter()
            .filter_map(|name| name.strip_prefix(prefix).map(str::to_string))
            .collect())
    }

    // snapshots

    pub fn tree(&self, oid: &ObjectId) -> Result<TreeArena> {
        TreeArena::load(self.store.clone(), *oid)
    }

    /// The directory at `path` in the snapshot of `commit`
    pub fn sub_tree(&self, commit: &Commit, path: &str) -> Result<(TreeArena, TreeIdx)> {
        let mut arena = commit.tree(&self.store)?;
        let idx = arena.sub_tree(arena.root(), path)?;

        Ok((arena, idx))
    }

    pub fn tree_entry_by_path(&self, commit: &Commit, path: &str) -> Result<TreeEntry> {
        commit.tree_entry(&self.store, path)
    }

    pub fn blob_by_path(&self, commit: &Commit, path: &str) -> Result<Blob> {
        commit.blob(&self.store, path)
    }

    pub fn is_image_file(&self, commit: &Commit, path: &str) -> bool {
        commit.is_image_file(&self.store, path)
    }

    /// Newest commit reachable from HEAD that changed `path`
    pub fn commit_by_path(&self, path: &str) -> Result<Option<Commit>> {
        self.last_commit_for_path(self.head_commit()?.oid(), path)
    }

    /// Newest commit reachable from `start` that changed `path`
    pub fn last_commit_for_path(&self, start: &ObjectId, path: &str) -> Result<Option<Commit>> {
        let mut pager = Pager::new(self.path_checker(path), 0, 1);
        self.walk(start, &mut pager)?;

        Ok(pager.into_commits().into_iter().next())
    }

    // history

    pub fn walk<V: Visitor + ?Sized>(&self, start: &ObjectId, visitor: &mut V) -> Result<()> {
        RevList::new(self.store.clone()).walk(start, visitor)
    }

    pub fn commits_count(&self, start: &ObjectId) -> Result<usize> {
        let mut counter = Counter::new();
        self.walk(start, &mut counter)?;

        Ok(counter.count())
    }

    /// One page of history, pages numbered from 1
    pub fn commits_by_range(&self, start: &ObjectId, page: usize) -> Result<Vec<Commit>> {
        self.page(start, Pager::new(AcceptAll, self.page_offset(page), self.page_limit()))
    }

    pub fn commits_before(&self, start: &ObjectId) -> Result<Vec<Commit>> {
        self.page(start, Pager::unbounded(AcceptAll))
    }

    /// The newest `limit` commits; zero means no limit
    pub fn commits_before_limit(&self, start: &ObjectId, limit: usize) -> Result<Vec<Commit>> {
        self.page(start, Pager::new(AcceptAll, 0, to_i64(limit)))
    }

    /// Commits whose message contains `keyword`, ignoring case
    pub fn search_commits(&self, start: &ObjectId, keyword: &str) -> Result<Vec<Commit>> {
        self.page(start, Pager::unbounded(Searcher::new(keyword)))
    }

    /// Number of commits that changed `path`, walking from `revision`
    pub fn file_commits_count(&self, revision: &str, path: &str) -> Result<usize> {
        let start = self.commit(revision)?;
        let mut counter = Counter::with_filter(self.path_checker(path));
        self.walk(start.oid(), &mut counter)?;

        Ok(counter.count())
    }

    /// Change counts for several paths computed in a single walk, in the
    /// order of `paths`
    pub fn file_commits_counts(&self, start: &ObjectId, paths: &[&str]) -> Result<Vec<usize>> {
        let mut counters = paths
            .iter()
            .map(|path| Counter::with_filter(self.path_checker(path)))
            .collect::<Vec<_>>();

        let mut chain = Chain::new();
        for counter in counters.iter_mut() {
            chain.push(counter);
        }
        self.walk(start, &mut chain)?;
        drop(chain);

        Ok(counters.iter().map(Counter::count).collect())
    }

    /// One page of the commits that changed `path`, pages numbered from 1
    pub fn commits_by_file_and_range(&self, revision: &str, path: &str, page: usize) -> Result<Vec<Commit>> {
        let start = self.commit(revision)?;
        let pager = Pager::new(self.path_checker(path), self.page_offset(page), self.page_limit());

        self.page(start.oid(), pager)
    }

    fn path_checker(&self, path: &str) -> PathChecker {
        PathChecker::new(self.store.clone(), path)
    }

    fn page<F: Filter>(&self, start: &ObjectId, mut pager: Pager<F>) -> Result<Vec<Commit>> {
        self.walk(start, &mut pager)?;
        Ok(pager.into_commits())
    }

    fn page_offset(&self, page: usize) -> i64 {
        to_i64(page.saturating_sub(1).saturating_mul(self.config.page_size()))
    }

    fn page_limit(&self) -> i64 {
        to_i64(self.config.page_size())
    }

    // entry history

    /// Last commit that changed each of `entries`, the children of the
    /// directory `tree_path` in `commit`; results follow the input order
    pub async fn entries_last_commits(
        &self,
        commit: &Commit,
        tree_path: &str,
        entries: &[TreeEntry],
    ) -> Result<Vec<EntryCommitInfo>> {
        self.entries_last_commits_with_cancellation(commit, tree_path, entries, CancellationToken::new())
            .await
    }

    /// Like [`Repository::entries_last_commits`], abandoning every walk once
    /// `token` is cancelled
    pub async fn entries_last_commits_with_cancellation(
        &self,
        commit: &Commit,
        tree_path: &str,
        entries: &[TreeEntry],
        token: CancellationToken,
    ) -> Result<Vec<EntryCommitInfo>> {
        LastCommits::new(self.store.clone(), self.config.max_concurrency())
            .with_cancellation(token)
            .resolve(commit, tree_path, entries)
            .await
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
