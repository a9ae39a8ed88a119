use crate::artifacts::log::visitor::{AcceptAll, Filter, Signal, Visitor};
use crate::artifacts::objects::commit::Commit;
use crate::errors::Result;

/// Counts the commits its filter accepts; never ends a walk early
#[derive(Debug, Default)]
pub struct Counter<F = AcceptAll> {
    filter: F,
    count: usize,
}

impl Counter {
    pub fn new() -> Self {
        Self::with_filter(AcceptAll)
    }
}

impl<F: Filter> Counter<F> {
    pub fn with_filter(filter: F) -> Self {
        Counter { filter, count: 0 }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl<F: Filter> Visitor for Counter<F> {
    fn visit(&mut self, commit: &Commit) -> Result<Signal> {
        if self.filter.accepts(commit)? {
            self.count += 1;
        }

        Ok(Signal::Continue)
    }
}
