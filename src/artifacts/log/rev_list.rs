//! History walker
//!
//! Emits the commits reachable from a start commit, each at most once and
//! never before any of its children in the walk. A first pass loads the
//! reachable commits and counts, for each one, the children that point to
//! it. A commit becomes ready once all of those children were emitted or
//! pruned; ready commits sit in a max-heap keyed by commit time, ties
//! broken by ascending object id. Clock skew therefore only reorders
//! commits that have no ancestry relation.
//!
//! Parents missing from the store are noted during the first pass and only
//! fail the walk when a visited commit asks for them, so a visitor that
//! stops early never sees the error.

use crate::areas::store::ObjectStore;
use crate::artifacts::log::visitor::{Signal, Visitor};
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

struct Ready(Commit);

impl Ready {
    fn key(&self) -> (i64, Reverse<&ObjectId>) {
        (self.0.timestamp(), Reverse(self.0.oid()))
    }
}

impl PartialEq for Ready {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Ready {}

impl PartialOrd for Ready {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ready {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Distinct parents of a commit, in record order
fn distinct_parents(commit: &Commit) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    commit
        .parents()
        .iter()
        .filter(|parent| seen.insert(**parent))
        .copied()
        .collect()
}

/// The reachable part of the graph, with the number of children of every
/// commit that are still to be emitted or pruned
struct Graph {
    commits: HashMap<ObjectId, Commit>,
    waiting_on: HashMap<ObjectId, usize>,
    missing: HashSet<ObjectId>,
    wanted: HashSet<ObjectId>,
}

impl Graph {
    /// Take one child off `parent`, asking for the parent when `want` is
    /// set, and collect the commits that became ready
    ///
    /// A commit whose children are all done but that no child asked for is
    /// pruned, which in turn releases its own parents.
    fn release(&mut self, parent: ObjectId, want: bool, ready: &mut BinaryHeap<Ready>) {
        if want {
            self.wanted.insert(parent);
        }

        let mut released = vec![parent];
        while let Some(oid) = released.pop() {
            let Some(waiting) = self.waiting_on.get_mut(&oid) else {
                continue;
            };
            *waiting = waiting.saturating_sub(1);
            if *waiting > 0 {
                continue;
            }

            let Some(commit) = self.commits.remove(&oid) else {
                continue;
            };
            if self.wanted.contains(&oid) {
                ready.push(Ready(commit));
            } else {
                released.extend(distinct_parents(&commit));
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RevList {
    store: Arc<dyn ObjectStore>,
    cancellation: CancellationToken,
}

impl RevList {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        RevList {
            store,
            cancellation: CancellationToken::new(),
        }
    }

    /// Observe `token` while loading the graph and at every heap pop; a
    /// cancelled walk fails with [`Error::Cancelled`]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Walk the ancestry of `start`, feeding every emitted commit to `visitor`
    ///
    /// # Arguments
    ///
    /// * `start` - the newest commit of the walk
    /// * `visitor` - policy deciding whether to go on after each commit
    ///
    /// A missing start commit, or a missing parent of a commit whose parents
    /// the visitor asked for, fails the walk with [`Error::MissingObject`];
    /// whatever the visitor gathered before that is left in the visitor.
    #[instrument(level = "debug", skip_all, fields(%start))]
    pub fn walk<V: Visitor + ?Sized>(&self, start: &ObjectId, visitor: &mut V) -> Result<()> {
        let mut graph = self.load_graph(start)?;
        let Some(start_commit) = graph.commits.remove(start) else {
            return Err(Error::MissingObject(*start));
        };

        let mut ready = BinaryHeap::from([Ready(start_commit)]);
        let mut visited = 0usize;

        while let Some(Ready(commit)) = ready.pop() {
            if self.cancellation.is_cancelled() {
                debug!(%start, visited, "walk cancelled");
                return Err(Error::Cancelled);
            }
            visited += 1;

            let signal = visitor.visit(&commit)?;
            if signal == Signal::Stop {
                break;
            }

            let want = signal == Signal::Continue;
            for parent in distinct_parents(&commit) {
                if want && graph.missing.contains(&parent) {
                    return Err(Error::MissingObject(parent));
                }
                graph.release(parent, want, &mut ready);
            }
        }

        debug!(%start, visited, "walk finished");
        Ok(())
    }

    /// Load every commit reachable from `start` and count the children of
    /// each inside that set
    fn load_graph(&self, start: &ObjectId) -> Result<Graph> {
        let mut graph = Graph {
            commits: HashMap::new(),
            waiting_on: HashMap::new(),
            missing: HashSet::new(),
            wanted: HashSet::new(),
        };

        let start_commit = Commit::load(self.store.as_ref(), start)?;
        let mut pending = vec![start_commit];

        while let Some(commit) = pending.pop() {
            if self.cancellation.is_cancelled() {
                debug!(%start, loaded = graph.commits.len(), "walk cancelled while loading");
                return Err(Error::Cancelled);
            }

            for parent in distinct_parents(&commit) {
                if graph.missing.contains(&parent) {
                    continue;
                }
                let waiting = graph.waiting_on.entry(parent).or_insert(0);
                *waiting += 1;
                if *waiting > 1 {
                    continue;
                }

                match Commit::load(self.store.as_ref(), &parent) {
                    Ok(parent_commit) => pending.push(parent_commit),
                    Err(Error::MissingObject(oid)) if oid == parent => {
                        graph.waiting_on.remove(&parent);
                        graph.missing.insert(parent);
                    }
                    Err(err) => return Err(err),
                }
            }

            graph.commits.insert(*commit.oid(), commit);
        }

        debug!(%start, reachable = graph.commits.len(), "loaded history graph");
        Ok(graph)
    }
}
