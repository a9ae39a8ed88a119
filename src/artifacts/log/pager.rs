use crate::artifacts::log::visitor::{AcceptAll, Filter, Signal, Visitor};
use crate::artifacts::objects::commit::Commit;
use crate::errors::Result;

/// Collects one page of accepted commits in emission order
///
/// Skips the first `offset` accepted commits, then keeps up to `limit` and
/// stops the walk once the page is full. A non-positive `offset` skips
/// nothing and a non-positive `limit` keeps everything.
#[derive(Debug)]
pub struct Pager<F = AcceptAll> {
    filter: F,
    skip: usize,
    limit: Option<usize>,
    commits: Vec<Commit>,
}

impl<F: Filter> Pager<F> {
    /// # Arguments
    ///
    /// * `filter` - decides which commits count
    /// * `offset` - accepted commits to skip before collecting
    /// * `limit` - page size
    pub fn new(filter: F, offset: i64, limit: i64) -> Self {
        Pager {
            filter,
            skip: usize::try_from(offset).unwrap_or(0),
            limit: usize::try_from(limit).ok().filter(|limit| *limit > 0),
            commits: Vec::new(),
        }
    }

    /// Collect every accepted commit
    pub fn unbounded(filter: F) -> Self {
        Self::new(filter, 0, 0)
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn into_commits(self) -> Vec<Commit> {
        self.commits
    }

    fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.commits.len() >= limit)
    }
}

impl<F: Filter> Visitor for Pager<F> {
    fn visit(&mut self, commit: &Commit) -> Result<Signal> {
        if self.is_full() {
            return Ok(Signal::Stop);
        }
        if !self.filter.accepts(commit)? {
            return Ok(Signal::Continue);
        }

        if self.skip > 0 {
            self.skip -= 1;
            return Ok(Signal::Continue);
        }

        self.commits.push(commit.clone());
        if self.is_full() {
            Ok(Signal::Stop)
        } else {
            Ok(Signal::Continue)
        }
    }
}
