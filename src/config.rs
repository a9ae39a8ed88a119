//! Runtime tuning
//!
//! Values come from the environment (`LINEAGE_MAX_CONCURRENCY`,
//! `LINEAGE_PAGE_SIZE`); the CLI may override them with flags.

use std::num::NonZeroUsize;
use tracing::warn;

pub const MAX_CONCURRENCY_ENV: &str = "LINEAGE_MAX_CONCURRENCY";
pub const PAGE_SIZE_ENV: &str = "LINEAGE_PAGE_SIZE";
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on concurrent history walks in the entry resolver
    max_concurrency: usize,
    /// Commits per page for paged history queries
    page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_concurrency: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn load_from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults and
    /// unparsable or zero values are reported and ignored
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Config {
            max_concurrency: positive(&lookup, MAX_CONCURRENCY_ENV).unwrap_or(defaults.max_concurrency),
            page_size: positive(&lookup, PAGE_SIZE_ENV).unwrap_or(defaults.page_size),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Zero is raised to one
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Zero is raised to one
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse::<NonZeroUsize>() {
        Ok(value) => Some(value.get()),
        Err(err) => {
            warn!(key, value = %raw, error = %err, "ignoring invalid setting");
            None
        }
    }
}
