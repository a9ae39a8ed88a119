//! Command implementations behind the `lineage` binary
//!
//! - `plumbing`: raw object inspection (cat-file, ls-tree)
//! - `porcelain`: history views (log, count, last-commits) and ref listing
//!
//! Every command writes to the `Write` it is handed, so the binary can send
//! output to stdout or to the pager.

pub mod plumbing;
pub mod porcelain;
