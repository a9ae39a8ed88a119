//! The visitor contract between the history walker and its policies

use crate::artifacts::objects::commit::Commit;
use crate::errors::Result;

/// What the walker should do after a commit was visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    /// Do not enqueue this commit's parents
    SkipBranch,
    /// End the walk now
    Stop,
}

impl Signal {
    /// Combine the signals of two visitors that saw the same commit
    ///
    /// `Stop` wins over `SkipBranch`, which wins over `Continue`.
    pub fn reconcile(self, other: Signal) -> Signal {
        match (self, other) {
            (Signal::Stop, _) | (_, Signal::Stop) => Signal::Stop,
            (Signal::SkipBranch, _) | (_, Signal::SkipBranch) => Signal::SkipBranch,
            _ => Signal::Continue,
        }
    }
}

/// A policy invoked once per commit emitted by the walker
pub trait Visitor {
    fn visit(&mut self, commit: &Commit) -> Result<Signal>;
}

/// The acceptance half of a policy: does this commit count?
pub trait Filter {
    fn accepts(&mut self, commit: &Commit) -> Result<bool>;
}

/// Accepts every commit
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Filter for AcceptAll {
    fn accepts(&mut self, _commit: &Commit) -> Result<bool> {
        Ok(true)
    }
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn visit(&mut self, commit: &Commit) -> Result<Signal> {
        (**self).visit(commit)
    }
}

impl<V: Visitor + ?Sized> Visitor for Box<V> {
    fn visit(&mut self, commit: &Commit) -> Result<Signal> {
        (**self).visit(commit)
    }
}

impl<F: Filter + ?Sized> Filter for &mut F {
    fn accepts(&mut self, commit: &Commit) -> Result<bool> {
        (**self).accepts(commit)
    }
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    fn accepts(&mut self, commit: &Commit) -> Result<bool> {
        (**self).accepts(commit)
    }
}

/// Runs several visitors on every commit, in order, and reconciles their
/// signals
///
/// Every visitor sees every commit the chain sees, even when an earlier one
/// already asked to stop.
#[derive(Default)]
pub struct Chain<'v> {
    visitors: Vec<Box<dyn Visitor + 'v>>,
}

impl<'v> Chain<'v> {
    pub fn new() -> Self {
        Chain { visitors: Vec::new() }
    }

    pub fn with(mut self, visitor: impl Visitor + 'v) -> Self {
        self.visitors.push(Box::new(visitor));
        self
    }

    pub fn push(&mut self, visitor: impl Visitor + 'v) {
        self.visitors.push(Box::new(visitor));
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}

impl Visitor for Chain<'_> {
    fn visit(&mut self, commit: &Commit) -> Result<Signal> {
        let mut signal = Signal::Continue;
        for visitor in &mut self.visitors {
            signal = signal.reconcile(visitor.visit(commit)?);
        }

        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::database::commit_record::CommitRecord;
    use crate::artifacts::objects::object_id::ObjectId;
    use crate::test_support::TestRepo;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    struct Fixed(Signal, usize);

    impl Visitor for Fixed {
        fn visit(&mut self, _commit: &Commit) -> Result<Signal> {
            self.1 += 1;
            Ok(self.0)
        }
    }

    fn commit() -> Commit {
        let signature = TestRepo::signature(1);
        let record = CommitRecord::new(ObjectId::default(), vec![], signature.clone(), signature, String::new());
        Commit::from_record(ObjectId::default(), record)
    }

    #[rstest]
    #[case(&[], Signal::Continue)]
    #[case(&[Signal::Continue, Signal::Continue], Signal::Continue)]
    #[case(&[Signal::Continue, Signal::SkipBranch], Signal::SkipBranch)]
    #[case(&[Signal::Stop, Signal::SkipBranch], Signal::Stop)]
    #[case(&[Signal::SkipBranch, Signal::Continue, Signal::Stop], Signal::Stop)]
    fn chain_reconciles_signals(#[case] signals: &[Signal], #[case] expected: Signal) {
        let mut chain = Chain::new();
        for signal in signals {
            chain.push(Fixed(*signal, 0));
        }

        assert_eq!(chain.visit(&commit()).unwrap(), expected);
    }

    #[test]
    fn every_visitor_sees_the_commit_after_a_stop() {
        let mut first = Fixed(Signal::Stop, 0);
        let mut second = Fixed(Signal::Continue, 0);
        {
            let mut chain = Chain::new().with(&mut first).with(&mut second);
            assert_eq!(chain.visit(&commit()).unwrap(), Signal::Stop);
        }

        assert_eq!((first.1, second.1), (1, 1));
    }
}
