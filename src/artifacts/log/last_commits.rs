//! Last change of every entry in a directory
//!
//! One history walk per entry, run concurrently on the blocking pool and
//! bounded by a semaphore. Results land in slots indexed like the input, so
//! they come back in input order whatever order the walks finish in.
//!
//! The first failure cancels every other walk and the call then waits for
//! all of them to wind down before returning that failure. Nothing is left
//! running after the call returns and no partial result is handed out.
//! Dropping the returned future, on a timeout for instance, cancels every
//! walk as well; walks already on the blocking pool stop at their next
//! commit.

use crate::areas::store::ObjectStore;
use crate::artifacts::log::pager::Pager;
use crate::artifacts::log::path_filter::PathChecker;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::submodule::SubModuleFile;
use crate::artifacts::objects::tree::TreeEntry;
use crate::errors::{Error, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// The last commit that changed an entry
#[derive(Debug, Clone)]
pub enum EntryCommitInfo {
    Entry { entry: TreeEntry, commit: Commit },
    SubModule { entry: TreeEntry, file: SubModuleFile },
}

impl EntryCommitInfo {
    pub fn entry(&self) -> &TreeEntry {
        match self {
            EntryCommitInfo::Entry { entry, .. } | EntryCommitInfo::SubModule { entry, .. } => entry,
        }
    }

    pub fn commit(&self) -> &Commit {
        match self {
            EntryCommitInfo::Entry { commit, .. } => commit,
            EntryCommitInfo::SubModule { file, .. } => &file.commit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LastCommits {
    store: Arc<dyn ObjectStore>,
    max_concurrency: usize,
    cancellation: CancellationToken,
}

impl LastCommits {
    pub fn new(store: Arc<dyn ObjectStore>, max_concurrency: usize) -> Self {
        LastCommits {
            store,
            max_concurrency: max_concurrency.max(1),
            cancellation: CancellationToken::new(),
        }
    }

    /// Cancelling `token` cancels every walk of a running call
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Find the last commit that changed each entry of the directory at
    /// `tree_path` in `commit`'s snapshot
    ///
    /// # Arguments
    ///
    /// * `commit` - the commit whose history is searched
    /// * `tree_path` - directory holding `entries`, empty for the root
    /// * `entries` - the entries to resolve
    #[instrument(level = "debug", skip_all, fields(commit = %commit.oid(), tree_path))]
    pub async fn resolve(&self, commit: &Commit, tree_path: &str, entries: &[TreeEntry]) -> Result<Vec<EntryCommitInfo>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let token = self.cancellation.child_token();
        // dropping this call mid-flight must also stop the blocking walks
        let _cancel_on_drop = token.clone().drop_guard();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let commit = Arc::new(commit.clone());

        let mut tasks = JoinSet::new();
        for (slot, entry) in entries.iter().enumerate() {
            let job = EntryJob {
                store: self.store.clone(),
                commit: commit.clone(),
                path: join_path(tree_path, entry.name()),
                entry: entry.clone(),
                token: token.clone(),
            };
            let semaphore = semaphore.clone();

            tasks.spawn(async move { (slot, job.run(semaphore).await) });
        }

        let mut slots: Vec<Option<EntryCommitInfo>> = vec![None; entries.len()];
        let mut first_error = None;

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok((slot, outcome)) => outcome.map(|info| (slot, info)),
                Err(err) => Err(Error::TaskFailed(err.to_string())),
            };

            match outcome {
                Ok((slot, info)) => slots[slot] = Some(info),
                Err(err) if first_error.is_none() => {
                    warn!(error = %err, "cancelling remaining history walks");
                    token.cancel();
                    first_error = Some(err);
                }
                Err(err) => debug!(error = %err, "history walk ended after cancellation"),
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        debug!(commit = %commit.oid(), tree_path, entries = entries.len(), "resolved last commits");
        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| Error::TaskFailed("result slot left empty".to_string())))
            .collect()
    }
}

struct EntryJob {
    store: Arc<dyn ObjectStore>,
    commit: Arc<Commit>,
    path: String,
    entry: TreeEntry,
    token: CancellationToken,
}

impl EntryJob {
    async fn run(self, semaphore: Arc<Semaphore>) -> Result<EntryCommitInfo> {
        let _permit = tokio::select! {
            permit = semaphore.acquire_owned() => permit.map_err(|_| Error::Cancelled)?,
            _ = self.token.cancelled() => return Err(Error::Cancelled),
        };
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::task::spawn_blocking(move || self.last_commit())
            .await
            .map_err(|err| Error::TaskFailed(err.to_string()))?
    }

    fn last_commit(self) -> Result<EntryCommitInfo> {
        let mut pager = Pager::new(PathChecker::new(self.store.clone(), self.path.as_str()), 0, 1);
        RevList::new(self.store.clone())
            .with_cancellation(self.token.clone())
            .walk(self.commit.oid(), &mut pager)?;

        let last = pager
            .into_commits()
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(self.path.clone()))?;

        if !self.entry.is_submodule() {
            return Ok(EntryCommitInfo::Entry {
                entry: self.entry,
                commit: last,
            });
        }

        let url = self
            .commit
            .submodule(&self.store, &self.path)?
            .map(|submodule| submodule.url.clone())
            .unwrap_or_default();
        let ref_id = *self.entry.oid();

        Ok(EntryCommitInfo::SubModule {
            entry: self.entry,
            file: SubModuleFile::new(last, url, ref_id),
        })
    }
}

fn join_path(tree_path: &str, name: &str) -> String {
    let tree_path = tree_path.trim_matches('/');
    if tree_path.is_empty() {
        name.to_string()
    } else {
        format!("{tree_path}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::database::database_entry::DatabaseEntry;
    use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
    use crate::artifacts::objects::object_id::ObjectId;
    use crate::artifacts::objects::tree::TreeArena;
    use crate::areas::store::{ObjectInfo, ObjectStream};
    use crate::artifacts::objects::object_type::ObjectType;
    use crate::test_support::TestRepo;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Slow store that counts object reads
    #[derive(Debug)]
    struct CountingStore {
        inner: Arc<dyn ObjectStore>,
        reads: AtomicUsize,
    }

    impl CountingStore {
        fn read(&self) {
            self.reads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl ObjectStore for CountingStore {
        fn open_object(&self, oid: &ObjectId) -> Result<(ObjectType, ObjectStream)> {
            self.read();
            self.inner.open_object(oid)
        }

        fn stat_object(&self, oid: &ObjectId) -> Result<ObjectInfo> {
            self.read();
            self.inner.stat_object(oid)
        }

        fn write_object(&self, object_type: ObjectType, body: &[u8]) -> Result<ObjectId> {
            self.inner.write_object(object_type, body)
        }

        fn resolve_ref(&self, name: &str) -> Result<ObjectId> {
            self.inner.resolve_ref(name)
        }

        fn list_refs(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.list_refs(prefix)
        }

        fn read_ref(&self, name: &str) -> Result<String> {
            self.inner.read_ref(name)
        }

        fn write_ref(&self, name: &str, target: &str) -> Result<()> {
            self.inner.write_ref(name, target)
        }

        fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
            self.inner.find_objects_by_prefix(prefix)
        }
    }

    fn last_commit_ids(infos: &[EntryCommitInfo]) -> Vec<(String, ObjectId)> {
        infos
            .iter()
            .map(|info| (info.entry().name().to_string(), *info.commit().oid()))
            .collect()
    }

    #[tokio::test]
    async fn resolves_every_entry_in_input_order() {
        let repo = TestRepo::new();
        let c0 = repo.commit(repo.snapshot(&[("src/a.rs", "a"), ("file.txt", "1")]), &[], 10, "init");
        let c1 = repo.commit(repo.snapshot(&[("src/a.rs", "a"), ("file.txt", "2")]), &[c0], 20, "edit file");
        let c2 = repo.commit(repo.snapshot(&[("src/a.rs", "a2"), ("file.txt", "2")]), &[c1], 30, "edit src");

        let store = repo.store();
        let head = Commit::load(store.as_ref(), &c2).unwrap();
        let arena = head.tree(&store).unwrap();
        let entries = arena.entries(arena.root()).to_vec();

        let infos = LastCommits::new(store, 1).resolve(&head, "", &entries).await.unwrap();
        assert_eq!(
            last_commit_ids(&infos),
            vec![("src".to_string(), c2), ("file.txt".to_string(), c1)]
        );
    }

    #[tokio::test]
    async fn resolves_entries_of_a_subdirectory() {
        let repo = TestRepo::new();
        let c0 = repo.commit(repo.snapshot(&[("src/a.rs", "a"), ("src/b.rs", "b")]), &[], 10, "init");
        let c1 = repo.commit(repo.snapshot(&[("src/a.rs", "a"), ("src/b.rs", "b2")]), &[c0], 20, "edit b");

        let store = repo.store();
        let head = Commit::load(store.as_ref(), &c1).unwrap();
        let mut arena = head.tree(&store).unwrap();
        let src = arena.sub_tree(arena.root(), "src").unwrap();
        let entries = arena.entries(src).to_vec();

        let infos = LastCommits::new(store, 4).resolve(&head, "src/", &entries).await.unwrap();
        assert_eq!(
            last_commit_ids(&infos),
            vec![("a.rs".to_string(), c0), ("b.rs".to_string(), c1)]
        );
    }

    #[tokio::test]
    async fn submodule_entries_carry_url_and_pinned_commit() {
        let repo = TestRepo::new();
        let pinned = ObjectId::from([0x5a; 20]);
        let gitmodules = repo.blob("[submodule \"lib\"]\n\tpath = lib\n\turl = https://example.com/lib.git\n");
        let tree = repo.tree(vec![
            DatabaseEntry::new(".gitmodules".to_string(), gitmodules, EntryMode::File(FileMode::Regular)),
            DatabaseEntry::new("lib".to_string(), pinned, EntryMode::Submodule),
        ]);
        let c0 = repo.commit(tree, &[], 10, "add lib");

        let store = repo.store();
        let head = Commit::load(store.as_ref(), &c0).unwrap();
        let arena = TreeArena::load(store.clone(), tree).unwrap();
        let entries = arena.entries(arena.root()).to_vec();

        let infos = LastCommits::new(store, 2).resolve(&head, "", &entries).await.unwrap();
        match &infos[0] {
            EntryCommitInfo::SubModule { entry, file } => {
                assert_eq!(entry.name(), "lib");
                assert_eq!(file.url, "https://example.com/lib.git");
                assert_eq!(file.ref_id, pinned);
                assert_eq!(file.commit.oid(), &c0);
            }
            other => panic!("expected a submodule, got {other:?}"),
        }
        assert!(matches!(&infos[1], EntryCommitInfo::Entry { entry, .. } if entry.name() == ".gitmodules"));
    }

    #[tokio::test]
    async fn entry_without_history_is_not_found() {
        let repo = TestRepo::new();
        let tree = repo.snapshot(&[("a.txt", "a")]);
        let c0 = repo.commit(tree, &[], 10, "init");
        let store = repo.store();
        let head = Commit::load(store.as_ref(), &c0).unwrap();

        // an entry listed from a snapshot the history never contained
        let foreign = repo.snapshot(&[("ghost.txt", "boo")]);
        let arena = TreeArena::load(store.clone(), foreign).unwrap();
        let entries = arena.entries(arena.root()).to_vec();

        let result = LastCommits::new(store, 2).resolve(&head, "", &entries).await;
        assert!(matches!(result, Err(Error::NotFound(path)) if path == "ghost.txt"));
    }

    #[tokio::test]
    async fn cancelled_call_fails_with_cancelled() {
        let repo = TestRepo::new();
        let tree = repo.snapshot(&[("a.txt", "a")]);
        let c0 = repo.commit(tree, &[], 10, "init");
        let store = repo.store();
        let head = Commit::load(store.as_ref(), &c0).unwrap();
        let arena = head.tree(&store).unwrap();
        let entries = arena.entries(arena.root()).to_vec();

        let token = CancellationToken::new();
        token.cancel();
        let result = LastCommits::new(store, 2)
            .with_cancellation(token)
            .resolve(&head, "", &entries)
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn dropping_the_call_stops_the_walks() {
        let repo = TestRepo::new();
        let mut parents = Vec::new();
        for i in 0..60 {
            let content = i.to_string();
            let tree = repo.snapshot(&[("a.txt", content.as_str()), ("b.txt", "b"), ("src/c.rs", "c")]);
            parents = vec![repo.commit(tree, &parents, 10 * (i + 1), &format!("c{i}"))];
        }

        let store = Arc::new(CountingStore {
            inner: repo.store(),
            reads: AtomicUsize::new(0),
        });
        let head = Commit::load(store.as_ref(), &parents[0]).unwrap();
        let arena = head.tree(&repo.store()).unwrap();
        let entries = arena.entries(arena.root()).to_vec();
        let resolver = LastCommits::new(store.clone(), 2);

        let timed_out = tokio::time::timeout(Duration::from_millis(50), resolver.resolve(&head, "", &entries)).await;
        assert!(timed_out.is_err());

        // walks on the blocking pool finish the read they are in, then stop
        tokio::time::sleep(Duration::from_millis(100)).await;
        let settled = store.reads();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(settled > 0);
        assert_eq!(store.reads(), settled);
    }

    #[test]
    fn joins_tree_paths() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("/src/", "a"), "src/a");
        assert_eq!(join_path("src/lib", "a"), "src/lib/a");
    }
}
